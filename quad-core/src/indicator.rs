//! Joystick code to tri-color indicator mapping.
//!
//! The mapping is a 256-entry table built at compile time, so every byte
//! value has exactly one entry and unknown codes fall through to all-off.

/// On/off state of the three indicator colors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IndicatorState {
    pub red: bool,
    pub green: bool,
    pub blue: bool,
}

impl IndicatorState {
    pub const OFF: Self = Self::rgb(false, false, false);

    #[must_use]
    pub const fn rgb(red: bool, green: bool, blue: bool) -> Self {
        Self { red, green, blue }
    }
}

/// The eight single-bit joystick codes and their colors.
pub const JOYSTICK_COLORS: [(u8, IndicatorState); 8] = [
    (0x01, IndicatorState::rgb(true, false, false)),
    (0x02, IndicatorState::rgb(true, true, false)),
    (0x04, IndicatorState::rgb(false, true, false)),
    (0x08, IndicatorState::rgb(true, false, true)),
    (0x10, IndicatorState::rgb(false, false, true)),
    (0x20, IndicatorState::rgb(false, true, true)),
    (0x40, IndicatorState::rgb(true, true, true)),
    (0x80, IndicatorState::rgb(true, false, true)),
];

const TABLE: [IndicatorState; 256] = build_table();

const fn build_table() -> [IndicatorState; 256] {
    let mut table = [IndicatorState::OFF; 256];
    let mut i = 0;
    while i < JOYSTICK_COLORS.len() {
        let (code, state) = JOYSTICK_COLORS[i];
        table[code as usize] = state;
        i += 1;
    }
    table
}

/// Indicator color for a joystick code.
#[inline]
#[must_use]
pub const fn indicator_for(joystick: u8) -> IndicatorState {
    TABLE[joystick as usize]
}

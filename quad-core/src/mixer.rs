//! Motor mixing for a plus-configuration quadrotor.
//!
//! ```text
//! front = clamp(throttle + pitch, MIN, MAX)
//! back  = clamp(throttle - pitch, MIN, MAX)
//! left  = clamp(throttle + roll,  MIN, MAX)
//! right = clamp(throttle - roll,  MIN, MAX)
//! ```
//!
//! Duty values are in percent, the unit the PWM collaborator takes.

use crate::pid::Corrections;

/// Motor position on the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorChannel {
    Front,
    Back,
    Left,
    Right,
}

impl MotorChannel {
    /// All channels in output order.
    pub const ALL: [Self; 4] = [Self::Front, Self::Back, Self::Left, Self::Right];

    /// Position of this channel in [`MotorChannel::ALL`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Front => 0,
            Self::Back => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }
}

/// Four motor duty values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorCommand {
    pub front: u8,
    pub back: u8,
    pub left: u8,
    pub right: u8,
}

impl MotorCommand {
    /// All motors stopped.
    pub const STOPPED: Self = Self {
        front: 0,
        back: 0,
        left: 0,
        right: 0,
    };

    /// Same duty on every channel.
    #[must_use]
    pub const fn uniform(duty: u8) -> Self {
        Self {
            front: duty,
            back: duty,
            left: duty,
            right: duty,
        }
    }

    #[must_use]
    pub const fn get(&self, channel: MotorChannel) -> u8 {
        match channel {
            MotorChannel::Front => self.front,
            MotorChannel::Back => self.back,
            MotorChannel::Left => self.left,
            MotorChannel::Right => self.right,
        }
    }
}

/// Valid duty range of the motor driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyRange {
    min: u8,
    max: u8,
}

impl DutyRange {
    /// Full PWM range, 0-100 %.
    pub const PERCENT: Self = Self { min: 0, max: 100 };

    /// Create a range; bounds are swapped if given in the wrong order.
    #[must_use]
    pub const fn new(min: u8, max: u8) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    #[inline]
    #[must_use]
    pub const fn min(&self) -> u8 {
        self.min
    }

    #[inline]
    #[must_use]
    pub const fn max(&self) -> u8 {
        self.max
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, duty: u8) -> bool {
        duty >= self.min && duty <= self.max
    }
}

impl Default for DutyRange {
    fn default() -> Self {
        Self::PERCENT
    }
}

/// Combines throttle with the axis corrections.
///
/// Throttle is taken in the same unit as the duty range. With
/// [`DutyRange::PERCENT`] the companion must send throttle bytes `0..=100`;
/// anything above saturates at full duty.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotorMixer {
    range: DutyRange,
}

impl MotorMixer {
    #[must_use]
    pub const fn new(range: DutyRange) -> Self {
        Self { range }
    }

    #[inline]
    #[must_use]
    pub const fn range(&self) -> DutyRange {
        self.range
    }

    /// Mix throttle and corrections into four clamped duty values.
    #[must_use]
    pub fn mix(&self, throttle: u8, corrections: Corrections) -> MotorCommand {
        self.mix_axes(throttle, corrections.pitch, corrections.roll)
    }

    /// Mix with explicit pitch and roll corrections.
    ///
    /// Non-finite corrections count as zero.
    #[must_use]
    pub fn mix_axes(&self, throttle: u8, pitch: f32, roll: f32) -> MotorCommand {
        let base = f32::from(throttle);
        let pitch = finite_or_zero(pitch);
        let roll = finite_or_zero(roll);

        MotorCommand {
            front: self.clamp(base + pitch),
            back: self.clamp(base - pitch),
            left: self.clamp(base + roll),
            right: self.clamp(base - roll),
        }
    }

    fn clamp(&self, value: f32) -> u8 {
        let clamped = libm::roundf(value).clamp(f32::from(self.range.min), f32::from(self.range.max));
        // In range of u8 by construction of DutyRange.
        clamped as u8
    }
}

#[inline]
fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

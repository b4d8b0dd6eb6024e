//! Compile-time defaults and the runtime configuration structs.

use crate::mixer::DutyRange;
use crate::orientation::Attitude;
use crate::pid::PidConfig;

/// Receive ring buffer capacity in bytes.
pub const RX_BUFFER_CAPACITY: usize = quad_proto::DEFAULT_CAPACITY;

/// Fixed delay between control cycles.
pub const LOOP_PERIOD_MS: u32 = 50;

/// Control loop sequencing options.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopConfig {
    /// Delay before each cycle in milliseconds.
    pub period_ms: u32,
    /// Feed orientation readings through the PID into the mixer.
    pub stabilization: bool,
    /// Target attitude for stabilization.
    pub setpoint: Attitude,
}

impl LoopConfig {
    pub const DEFAULT: Self = Self {
        period_ms: LOOP_PERIOD_MS,
        stabilization: false,
        setpoint: Attitude::LEVEL,
    };
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Everything the control core needs to be tuned.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlightConfig {
    pub loop_config: LoopConfig,
    pub pitch: PidConfig,
    pub roll: PidConfig,
    pub duty: DutyRange,
}

impl FlightConfig {
    pub const DEFAULT: Self = Self {
        loop_config: LoopConfig::DEFAULT,
        pitch: PidConfig::DEFAULT,
        roll: PidConfig::DEFAULT,
        duty: DutyRange::PERCENT,
    };

    /// Defaults with the stabilization path switched on or off.
    #[must_use]
    pub const fn with_stabilization(mut self, enabled: bool) -> Self {
        self.loop_config.stabilization = enabled;
        self
    }
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

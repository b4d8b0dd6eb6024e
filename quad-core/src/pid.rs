//! Per-axis stabilization (PID) controllers.
//!
//! Each axis runs a discrete PID on the angle error:
//!
//! ```text
//! error      = setpoint - measured
//! integral   = clamp(integral + error * dt, ±integral_limit)
//! derivative = (error - previous_error) / dt
//! output     = clamp(kp * error + ki * integral + kd * derivative, ±output_limit)
//! ```
//!
//! `dt` comes from a measured tick delta, never a constant. A zero (or
//! otherwise unusable) `dt` leaves the controller untouched and repeats the
//! previous output.

use crate::orientation::Attitude;

const MICROS_PER_SECOND: f32 = 1_000_000.0;

/// Proportional, integral and derivative gains.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl PidGains {
    #[must_use]
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }
}

/// Gains plus the anti-windup and output bounds for one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidConfig {
    pub gains: PidGains,
    /// Bound on the integral accumulator (degree-seconds).
    pub integral_limit: f32,
    /// Bound on the correction term (duty percent).
    pub output_limit: f32,
}

impl PidConfig {
    /// Angle-hold defaults, output in duty percent.
    pub const DEFAULT: Self = Self {
        gains: PidGains::new(0.4, 0.02, 0.08),
        integral_limit: 100.0,
        output_limit: 25.0,
    };

    #[must_use]
    pub const fn new(gains: PidGains, integral_limit: f32, output_limit: f32) -> Self {
        Self {
            gains,
            integral_limit,
            output_limit,
        }
    }
}

impl Default for PidConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Single-axis PID controller and its state.
#[derive(Clone, Debug)]
pub struct PidController {
    gains: PidGains,
    integral_limit: f32,
    output_limit: f32,

    integral: f32,
    previous_error: f32,
    previous_output: f32,
    last_timestamp_us: Option<u64>,
}

impl PidController {
    #[must_use]
    pub fn new(config: PidConfig) -> Self {
        Self {
            gains: config.gains,
            // `f32::clamp` panics on inverted or NaN bounds.
            integral_limit: non_negative(config.integral_limit),
            output_limit: non_negative(config.output_limit),
            integral: 0.0,
            previous_error: 0.0,
            previous_output: 0.0,
            last_timestamp_us: None,
        }
    }

    /// Advance the controller by `dt` seconds and return the correction.
    ///
    /// If `dt` is not a positive finite number, or either angle is not
    /// finite, the state is left as is and the previous output is returned.
    pub fn update(&mut self, setpoint: f32, measured: f32, dt: f32) -> f32 {
        if !(dt > 0.0 && dt.is_finite()) || !setpoint.is_finite() || !measured.is_finite() {
            return self.previous_output;
        }

        let error = setpoint - measured;

        self.integral =
            (self.integral + error * dt).clamp(-self.integral_limit, self.integral_limit);
        let derivative = (error - self.previous_error) / dt;
        self.previous_error = error;

        let PidGains { kp, ki, kd } = self.gains;
        let output = (kp * error + ki * self.integral + kd * derivative)
            .clamp(-self.output_limit, self.output_limit);

        // Finite gains can still overflow to infinity.
        if output.is_finite() {
            self.previous_output = output;
        }
        self.previous_output
    }

    /// Advance the controller using a monotonic timestamp in microseconds.
    ///
    /// The elapsed time is measured against the previous call. The first call
    /// only records the timestamp and returns the previous output.
    pub fn update_at(&mut self, setpoint: f32, measured: f32, now_us: u64) -> f32 {
        let Some(last) = self.last_timestamp_us.replace(now_us) else {
            return self.previous_output;
        };
        let dt = now_us.saturating_sub(last) as f32 / MICROS_PER_SECOND;
        self.update(setpoint, measured, dt)
    }

    /// Clear the accumulated state, keeping the configuration.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.previous_output = 0.0;
        self.last_timestamp_us = None;
    }

    #[inline]
    #[must_use]
    pub fn integral(&self) -> f32 {
        self.integral
    }

    #[inline]
    #[must_use]
    pub fn previous_output(&self) -> f32 {
        self.previous_output
    }
}

fn non_negative(limit: f32) -> f32 {
    // max() also maps NaN to 0.0
    if limit < 0.0 {
        -limit
    } else {
        limit.max(0.0)
    }
}

/// Pitch and roll corrections in duty percent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Corrections {
    pub pitch: f32,
    pub roll: f32,
}

impl Corrections {
    pub const ZERO: Self = Self {
        pitch: 0.0,
        roll: 0.0,
    };
}

/// Independent pitch and roll controllers.
#[derive(Clone, Debug)]
pub struct StabilizationController {
    pitch: PidController,
    roll: PidController,
}

impl StabilizationController {
    #[must_use]
    pub fn new(pitch: PidConfig, roll: PidConfig) -> Self {
        Self {
            pitch: PidController::new(pitch),
            roll: PidController::new(roll),
        }
    }

    /// Compute both corrections for the attitude measured at `now_us`.
    pub fn update(&mut self, setpoint: Attitude, measured: Attitude, now_us: u64) -> Corrections {
        Corrections {
            pitch: self.pitch.update_at(setpoint.pitch, measured.pitch, now_us),
            roll: self.roll.update_at(setpoint.roll, measured.roll, now_us),
        }
    }

    pub fn reset(&mut self) {
        self.pitch.reset();
        self.roll.reset();
    }

    #[must_use]
    pub fn pitch(&self) -> &PidController {
        &self.pitch
    }

    #[must_use]
    pub fn roll(&self) -> &PidController {
        &self.roll
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        let d = a - b;
        d < 1e-4 && d > -1e-4
    }

    fn config(kp: f32, ki: f32, kd: f32) -> PidConfig {
        PidConfig::new(PidGains::new(kp, ki, kd), 1000.0, 1000.0)
    }

    #[test]
    fn test_zero_error_gives_zero_output_for_any_gains() {
        for scale in [0.5f32, 1.0, 3.0, 100.0] {
            let mut pid = PidController::new(config(0.4 * scale, 0.02 * scale, 0.08 * scale));
            assert_eq!(pid.update(12.5, 12.5, 0.05), 0.0);
            assert_eq!(pid.update(-3.0, -3.0, 0.05), 0.0);
        }
    }

    #[test]
    fn test_proportional_term() {
        let mut pid = PidController::new(config(2.0, 0.0, 0.0));
        assert!(approx(pid.update(3.0, 0.0, 0.05), 6.0));
    }

    #[test]
    fn test_integral_accumulates_over_elapsed_time() {
        let mut pid = PidController::new(config(0.0, 1.0, 0.0));
        pid.update(1.0, 0.0, 0.5);
        let out = pid.update(1.0, 0.0, 0.5);
        assert!(approx(pid.integral(), 1.0));
        assert!(approx(out, 1.0));
    }

    #[test]
    fn test_integral_anti_windup() {
        let mut pid = PidController::new(PidConfig::new(PidGains::new(0.0, 1.0, 0.0), 2.0, 1000.0));
        for _ in 0..100 {
            pid.update(10.0, 0.0, 0.1);
        }
        assert!(approx(pid.integral(), 2.0));
        assert!(approx(pid.previous_output(), 2.0));
    }

    #[test]
    fn test_derivative_term() {
        let mut pid = PidController::new(config(0.0, 0.0, 1.0));
        pid.update(0.0, 0.0, 0.5);
        assert!(approx(pid.update(1.0, 0.0, 0.5), 2.0));
    }

    #[test]
    fn test_output_is_clamped() {
        let mut pid = PidController::new(PidConfig::new(PidGains::new(10.0, 0.0, 0.0), 1.0, 25.0));
        assert!(approx(pid.update(90.0, 0.0, 0.05), 25.0));
        assert!(approx(pid.update(-90.0, 0.0, 0.05), -25.0));
    }

    #[test]
    fn test_zero_dt_holds_previous_output() {
        let mut pid = PidController::new(config(1.0, 1.0, 1.0));
        let first = pid.update(2.0, 0.0, 1.0);
        let integral = pid.integral();

        assert_eq!(pid.update(10.0, 0.0, 0.0), first);
        assert_eq!(pid.update(10.0, 0.0, -1.0), first);
        assert_eq!(pid.update(10.0, 0.0, f32::NAN), first);
        assert_eq!(pid.integral(), integral);
    }

    #[test]
    fn test_negative_limits_are_sanitised() {
        let mut pid = PidController::new(PidConfig::new(PidGains::new(1.0, 0.0, 0.0), -5.0, -4.0));
        assert!(approx(pid.update(100.0, 0.0, 0.1), 4.0));
    }

    #[test]
    fn test_non_finite_angle_leaves_state_untouched() {
        let mut pid = PidController::new(config(1.0, 1.0, 0.0));
        let before = pid.update(5.0, 0.0, 0.1);
        let integral = pid.integral();

        assert_eq!(pid.update(0.0, f32::NAN, 0.1), before);
        assert_eq!(pid.update(f32::INFINITY, 0.0, 0.1), before);
        assert_eq!(pid.integral(), integral);

        // Later finite samples still move the output.
        let after = pid.update(-5.0, 0.0, 0.1);
        assert!(after.is_finite());
        assert!(after < before);
        assert!(approx(pid.integral(), 0.0));
    }

    #[test]
    fn test_update_at_measures_tick_delta() {
        let mut pid = PidController::new(config(0.0, 1.0, 0.0));
        // First sample only records the timestamp.
        assert_eq!(pid.update_at(2.0, 0.0, 1_000_000), 0.0);
        // 0.5 s later: integral = 2.0 * 0.5
        assert!(approx(pid.update_at(2.0, 0.0, 1_500_000), 1.0));
    }

    #[test]
    fn test_update_at_same_timestamp_is_guarded() {
        let mut pid = PidController::new(config(1.0, 0.0, 0.0));
        pid.update_at(0.0, 0.0, 10);
        let out = pid.update_at(5.0, 0.0, 20_010);
        assert!(approx(out, 5.0));
        assert_eq!(pid.update_at(50.0, 0.0, 20_010), out);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut pid = PidController::new(config(1.0, 1.0, 0.0));
        pid.update_at(0.0, 0.0, 0);
        pid.update_at(4.0, 0.0, 100_000);
        pid.reset();
        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.previous_output(), 0.0);
        assert_eq!(pid.update_at(4.0, 0.0, 200_000), 0.0);
    }

    #[test]
    fn test_axes_are_independent() {
        let cfg = config(1.0, 0.0, 0.0);
        let mut stab = StabilizationController::new(cfg, cfg);
        let level = Attitude::LEVEL;
        let measured = Attitude::new(10.0, -4.0);

        assert_eq!(stab.update(level, measured, 0), Corrections::ZERO);
        let c = stab.update(level, measured, 50_000);
        assert!(approx(c.pitch, -10.0));
        assert!(approx(c.roll, 4.0));
        assert!(approx(stab.pitch().integral(), -0.5));
        assert!(approx(stab.roll().previous_output(), 4.0));

        stab.reset();
        assert_eq!(stab.pitch().previous_output(), 0.0);
        assert_eq!(stab.roll().integral(), 0.0);
    }
}

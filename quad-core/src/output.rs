//! Output collaborator traits and their `embedded-hal` adapters.
//!
//! - [`MotorDriver`]: per-channel PWM duty writes, adapted by [`PwmMotors`]
//! - [`IndicatorDriver`]: tri-color indicator, adapted by [`RgbLed`]
//! - [`MotorShadow`]: suppresses duty writes that would not change anything

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};

use crate::indicator::IndicatorState;
use crate::mixer::{MotorChannel, MotorCommand};

/// Error type for output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// Peripheral rejected the write.
    Io,
}

impl From<pwm::ErrorKind> for OutputError {
    fn from(_: pwm::ErrorKind) -> Self {
        Self::Io
    }
}

impl From<digital::ErrorKind> for OutputError {
    fn from(_: digital::ErrorKind) -> Self {
        Self::Io
    }
}

/// Motor PWM driver.
pub trait MotorDriver {
    /// Set the duty (percent) of one motor channel.
    fn set_duty(&mut self, channel: MotorChannel, duty: u8) -> Result<(), OutputError>;
}

/// Tri-color indicator driver.
pub trait IndicatorDriver {
    /// Switch each color on or off.
    fn show(&mut self, state: IndicatorState) -> Result<(), OutputError>;
}

impl<T: MotorDriver + ?Sized> MotorDriver for &mut T {
    fn set_duty(&mut self, channel: MotorChannel, duty: u8) -> Result<(), OutputError> {
        T::set_duty(self, channel, duty)
    }
}

impl<T: IndicatorDriver + ?Sized> IndicatorDriver for &mut T {
    fn show(&mut self, state: IndicatorState) -> Result<(), OutputError> {
        T::show(self, state)
    }
}

/// Last duty successfully written to each channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotorShadow {
    last_written: [Option<u8>; 4],
}

impl MotorShadow {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_written: [None; 4],
        }
    }

    /// Last value written to `channel`, if any.
    #[must_use]
    pub fn last_written(&self, channel: MotorChannel) -> Option<u8> {
        self.last_written[channel.index()]
    }

    /// Write every channel whose duty differs from the last write.
    ///
    /// Returns the number of channels written. All channels are attempted
    /// even if one fails; a failed channel keeps its old shadow value so it
    /// is written again on the next call, and the first error is returned.
    pub fn apply<M: MotorDriver>(
        &mut self,
        driver: &mut M,
        command: &MotorCommand,
    ) -> Result<usize, OutputError> {
        let mut written = 0;
        let mut first_error = None;

        for channel in MotorChannel::ALL {
            let duty = command.get(channel);
            let slot = &mut self.last_written[channel.index()];
            if *slot == Some(duty) {
                continue;
            }
            match driver.set_duty(channel, duty) {
                Ok(()) => {
                    *slot = Some(duty);
                    written += 1;
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }

    /// Forget all shadow values so the next [`apply`](Self::apply) writes every channel.
    pub fn invalidate(&mut self) {
        self.last_written = [None; 4];
    }
}

/// [`MotorDriver`] over four `embedded-hal` PWM outputs.
///
/// Outputs are ordered front, back, left, right.
pub struct PwmMotors<P> {
    outputs: [P; 4],
}

impl<P: SetDutyCycle> PwmMotors<P> {
    #[must_use]
    pub fn new(front: P, back: P, left: P, right: P) -> Self {
        Self {
            outputs: [front, back, left, right],
        }
    }

    /// Release the underlying outputs.
    pub fn into_outputs(self) -> [P; 4] {
        self.outputs
    }
}

impl<P: SetDutyCycle> MotorDriver for PwmMotors<P> {
    fn set_duty(&mut self, channel: MotorChannel, duty: u8) -> Result<(), OutputError> {
        self.outputs[channel.index()]
            .set_duty_cycle_percent(duty.min(100))
            .map_err(|e| pwm::Error::kind(&e).into())
    }
}

/// Electrical polarity of the indicator pins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    #[default]
    ActiveHigh,
    /// Common-anode LEDs: the color is lit when the pin is low.
    ActiveLow,
}

/// [`IndicatorDriver`] over three GPIO outputs.
pub struct RgbLed<R, G, B> {
    red: R,
    green: G,
    blue: B,
    polarity: Polarity,
}

impl<R: OutputPin, G: OutputPin, B: OutputPin> RgbLed<R, G, B> {
    #[must_use]
    pub fn new(red: R, green: G, blue: B, polarity: Polarity) -> Self {
        Self {
            red,
            green,
            blue,
            polarity,
        }
    }

    /// Release the underlying pins.
    pub fn into_pins(self) -> (R, G, B) {
        (self.red, self.green, self.blue)
    }
}

fn drive<P: OutputPin>(pin: &mut P, on: bool, polarity: Polarity) -> Result<(), OutputError> {
    let high = match polarity {
        Polarity::ActiveHigh => on,
        Polarity::ActiveLow => !on,
    };
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.map_err(|e| digital::Error::kind(&e).into())
}

impl<R: OutputPin, G: OutputPin, B: OutputPin> IndicatorDriver for RgbLed<R, G, B> {
    fn show(&mut self, state: IndicatorState) -> Result<(), OutputError> {
        drive(&mut self.red, state.red, self.polarity)?;
        drive(&mut self.green, state.green, self.polarity)?;
        drive(&mut self.blue, state.blue, self.polarity)
    }
}

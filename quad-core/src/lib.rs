//! Platform-agnostic flight control core for a plus-configuration quadcopter.
//!
//! This crate turns the bytes received over the serial link into motor duty
//! values and an indicator color, optionally closing a pitch/roll
//! stabilization loop around an orientation sensor. It has no
//! platform-specific dependencies and runs on host for testing.
//!
//! # Overview
//!
//! - [`command`]: Hold-last-value command state ([`CommandState`])
//! - [`indicator`]: Joystick code to color mapping ([`indicator_for`])
//! - [`orientation`]: Orientation sensor trait and startup gate
//!   ([`OrientationSource`], [`OrientationGate`], [`Mpu6050`])
//! - [`pid`]: Per-axis PID controllers ([`PidController`], [`StabilizationController`])
//! - [`mixer`]: Throttle and correction mixing ([`MotorMixer`])
//! - [`output`]: Motor and indicator driver traits plus `embedded-hal` adapters
//! - [`control`]: The periodic control cycle ([`ControlLoop`])
//! - [`config`]: Tunables and compile-time defaults ([`FlightConfig`])
//!
//! # Control Cycle
//!
//! ```text
//! delay(period) → snapshot rx buffer → decode → indicator
//!              → read attitude → PID (optional) → mix → motors
//! ```
//!
//! # Example
//!
//! ```
//! use quad_core::{indicator_for, Corrections, DutyRange, IndicatorState, MotorCommand, MotorMixer};
//!
//! let mixer = MotorMixer::new(DutyRange::PERCENT);
//! assert_eq!(mixer.mix(0x64, Corrections::ZERO), MotorCommand::uniform(100));
//! assert_eq!(indicator_for(0x04), IndicatorState::rgb(false, true, false));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging (for embedded targets)
//! - **`log`**: Route diagnostics through the `log` crate instead

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// This must go first so the macros are visible to the other modules.
mod fmt;

pub mod command;
pub mod config;
pub mod control;
pub mod indicator;
pub mod mixer;
pub mod orientation;
pub mod output;
pub mod pid;

pub use command::CommandState;
pub use config::{FlightConfig, LoopConfig, LOOP_PERIOD_MS, RX_BUFFER_CAPACITY};
pub use control::{ControlLoop, CycleReport, FlightContext, TickSource};
pub use indicator::{indicator_for, IndicatorState, JOYSTICK_COLORS};
pub use mixer::{DutyRange, MotorChannel, MotorCommand, MotorMixer};
pub use orientation::{Attitude, Mpu6050, NoSensor, OrientationGate, OrientationSource, SensorError};
pub use output::{
    IndicatorDriver, MotorDriver, MotorShadow, OutputError, Polarity, PwmMotors, RgbLed,
};
pub use pid::{Corrections, PidConfig, PidController, PidGains, StabilizationController};

pub use quad_proto::{
    decode, encode, Command, DecodeError, Producer, RingBuffer, SERIAL_BAUDRATE,
};

/// Poll a future that never pends (all mocks complete immediately).
#[cfg(test)]
pub(crate) fn block_on<F: core::future::Future>(mut f: F) -> F::Output {
    use core::pin::Pin;
    use core::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn noop_raw_waker() -> RawWaker {
        fn noop(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            noop_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, noop, noop, noop);
        RawWaker::new(core::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(noop_raw_waker()) };
    let mut cx = Context::from_waker(&waker);

    // SAFETY: `f` is not moved after being pinned
    let mut f = unsafe { Pin::new_unchecked(&mut f) };

    match f.as_mut().poll(&mut cx) {
        Poll::Ready(result) => result,
        Poll::Pending => panic!("mock future returned Pending"),
    }
}

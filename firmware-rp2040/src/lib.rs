//! Quadcopter flight controller firmware for RP2040.
//!
//! This crate binds the chip-agnostic control core to RP2040 peripherals
//! through Embassy.
//!
//! # Overview
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Receives 4-byte command frames over UART (9600 baud, 8N1)
//! 2. Every 50 ms decodes the latest frame from the receive ring buffer
//! 3. Shows the joystick direction on an RGB LED
//! 4. Drives four motor PWM outputs from the throttle, optionally corrected
//!    by a pitch/roll PID fed from an MPU-6050
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Description |
//! |----------|------|-------------|
//! | UART1 RX | 9    | Command link from the radio module |
//! | PWM1 A   | 2    | Front motor |
//! | PWM1 B   | 3    | Back motor |
//! | PWM2 A   | 4    | Left motor |
//! | PWM2 B   | 5    | Right motor |
//! | LED R    | 6    | Indicator red |
//! | LED G    | 7    | Indicator green |
//! | LED B    | 8    | Indicator blue |
//! | I2C0 SDA | 16   | MPU-6050 data |
//! | I2C0 SCL | 17   | MPU-6050 clock |
//!
//! # Architecture
//!
//! Two executors share one [`RingBuffer`]:
//!
//! - **Receive task** (interrupt executor on `SWI_IRQ_1`): pushes every UART
//!   byte through the buffer's single [`Producer`]
//! - **Control task** (thread executor): waits one period, snapshots the
//!   buffer and runs one [`ControlLoop`] step
//!
//! The buffer is lock-free, so the control task never blocks the receiver.
//!
//! # Modules
//!
//! - [`clock`]: Embassy-backed [`TickSource`] ([`EmbassyClock`])
//! - [`serial`]: UART receive pump ([`SerialReceiver`])
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`stabilization`**: Close the pitch/roll loop around the IMU
//! - **`rgb-active-low`**: Drive a common-anode RGB LED
//!
//! # Re-exports
//!
//! This crate re-exports the public items of [`quad_core`] that the binary
//! wires together, so it only needs to depend on this crate.

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features - they define conflicting panic handlers");

pub use quad_core::{
    ControlLoop, CycleReport, FlightConfig, FlightContext, IndicatorState, Mpu6050, MotorCommand,
    OrientationGate, Polarity, Producer, PwmMotors, RgbLed, RingBuffer, TickSource,
    RX_BUFFER_CAPACITY, SERIAL_BAUDRATE,
};

pub mod clock;
pub mod serial;

pub use clock::EmbassyClock;
pub use serial::SerialReceiver;

/// Flight configuration selected by the Cargo features.
#[must_use]
pub const fn flight_config() -> FlightConfig {
    FlightConfig::DEFAULT.with_stabilization(cfg!(feature = "stabilization"))
}

/// Indicator polarity selected by the Cargo features.
#[must_use]
pub const fn led_polarity() -> Polarity {
    if cfg!(feature = "rgb-active-low") {
        Polarity::ActiveLow
    } else {
        Polarity::ActiveHigh
    }
}

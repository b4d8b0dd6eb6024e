//! Serial command link for the quadcopter controller.
//!
//! This crate provides the two pieces that sit between the UART and the
//! control loop:
//!
//! - **Receive buffer**: [`RingBuffer`] and its single-writer [`Producer`]
//!   handle. The serial receive context pushes bytes; the control loop copies
//!   a snapshot once per cycle.
//! - **Framing**: [`decode`] extracts a [`Command`] from a snapshot at any
//!   rotation, and [`encode`] builds the frame a companion module sends.
//!
//! # Wire Format
//!
//! 9600 baud, 8N1, no parity:
//!
//! | Field | Value |
//! |---|---|
//! | Start marker | `0x23` |
//! | Throttle | `0x00`-`0xFF` |
//! | Joystick code | single-bit direction code, or don't-care |
//! | End marker | `0x2F` |
//!
//! # Example
//!
//! ```
//! use quad_proto::{decode, encode, Command, RingBuffer};
//!
//! let ring: RingBuffer<10> = RingBuffer::new();
//! let producer = ring.producer().unwrap();
//! producer.push_slice(&encode(Command::new(0x64, 0x04)));
//!
//! assert_eq!(decode(&ring.snapshot()), Ok(Command::new(0x64, 0x04)));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging (for embedded targets)
//! - **`log`**: Route diagnostics through the `log` crate instead
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// This must go first so the macros are visible to the other modules.
mod fmt;

pub mod frame;
pub mod ring;

pub use frame::{
    decode, encode, encode_into, Command, DecodeError, END_MARKER, FRAME_LEN, START_MARKER,
};
pub use ring::{Producer, RingBuffer, DEFAULT_CAPACITY};

/// Serial link baud rate used by the companion radio module.
pub const SERIAL_BAUDRATE: u32 = 9_600;

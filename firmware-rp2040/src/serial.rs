//! UART receive pump feeding the command ring buffer.
//!
//! # Pins
//!
//! Uses UART1 RX on GPIO 9. Nothing is transmitted, so no TX pin is claimed.

use defmt::warn;
use embassy_rp::uart::{Async, UartRx};
use quad_core::Producer;

/// Owns the UART receiver and the write side of the ring buffer.
pub struct SerialReceiver<'d, 'r, const N: usize> {
    rx: UartRx<'d, Async>,
    producer: Producer<'r, N>,
}

impl<'d, 'r, const N: usize> SerialReceiver<'d, 'r, N> {
    #[must_use]
    pub fn new(rx: UartRx<'d, Async>, producer: Producer<'r, N>) -> Self {
        Self { rx, producer }
    }

    /// Push every received byte into the ring buffer, forever.
    ///
    /// Line errors drop the offending byte; the decoder resynchronizes on the
    /// next frame markers.
    pub async fn run(&mut self) -> ! {
        let mut byte = [0u8; 1];
        loop {
            match self.rx.read(&mut byte).await {
                Ok(()) => self.producer.push(byte[0]),
                Err(e) => warn!("UART receive error: {:?}", e),
            }
        }
    }
}

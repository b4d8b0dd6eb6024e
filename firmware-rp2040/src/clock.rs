//! Monotonic time for the PID from the Embassy time driver.

use embassy_time::Instant;
use quad_core::TickSource;

/// [`TickSource`] reading the Embassy uptime clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbassyClock;

impl TickSource for EmbassyClock {
    #[inline]
    fn now_us(&self) -> u64 {
        Instant::now().as_micros()
    }
}

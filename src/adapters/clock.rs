//! Wall-clock implementation of the [`Clock`] port.

use std::thread;
use std::time::{Duration, Instant};

use crate::app::ports::Clock;

/// The process clock: monotonic now, real sleeps.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

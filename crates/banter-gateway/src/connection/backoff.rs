//! Reconnect delay schedule
//!
//! Full-jitter exponential backoff: each attempt draws a uniform delay
//! below `min(max, base * 2^attempt)`.

use std::time::Duration;

/// Full-jitter exponential backoff
#[derive(Debug)]
pub(crate) struct Backoff {
    /// Ceiling for the first attempt
    base: Duration,

    /// Absolute delay ceiling
    max: Duration,

    /// Attempts drawn since the last reset
    attempt: u32,
}

impl Backoff {
    pub(crate) fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempt: 0,
        }
    }

    /// Draw the next delay and advance the attempt counter
    pub(crate) fn next_delay(&mut self) -> Duration {
        let ceiling = self
            .base
            .saturating_mul(1u32.checked_shl(self.attempt).unwrap_or(u32::MAX))
            .min(self.max);
        self.attempt = self.attempt.saturating_add(1);
        ceiling.mul_f64(rand::random::<f64>())
    }

    /// Attempts drawn since the last reset
    pub(crate) fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Clear the attempt counter once a session is established
    pub(crate) fn reset(&mut self) {
        self.attempt = 0;
    }
}

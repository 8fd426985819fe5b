//! Fixed-rate pause between consecutive calls to the content API or the database.

use std::time::Duration;

/// Sleeps for a fixed delay when asked to; a zero delay never suspends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    delay: Duration,
}

impl Throttle {
    /// Creates a throttle with the given delay.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// A throttle that never waits.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    /// The configured delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits for the configured delay.
    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

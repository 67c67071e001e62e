//! Reconnect policy: a fixed delay after every close, no back-off.
//!
//! The keep-alive tick also calls `connect()`, so the worst case is one
//! attempt per delay plus one per tick.

use std::time::Duration;

use sentinel_domain::config::DEFAULT_RECONNECT_DELAY;

/// Controls when the connection manager retries after a close event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Wait between a close event and the next connection attempt.
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl ReconnectPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    /// Delay before the next attempt.  Independent of how many attempts
    /// already failed.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

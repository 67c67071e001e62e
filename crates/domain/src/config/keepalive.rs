use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Keep-alive timer
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const DEFAULT_KEEPALIVE_PERIOD: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeepAliveConfig {
    /// Seconds between keep-alive ticks (reconnect check + heartbeat).
    #[serde(default = "d_period_secs")]
    pub period_secs: u64,
}

impl KeepAliveConfig {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            period_secs: d_period_secs(),
        }
    }
}

fn d_period_secs() -> u64 {
    DEFAULT_KEEPALIVE_PERIOD.as_secs()
}

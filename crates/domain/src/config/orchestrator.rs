use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Orchestrator connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const DEFAULT_ORCHESTRATOR_URL: &str = "ws://localhost:8000/ws/crawler";

/// Fixed wait between a close event and the next connection attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// WebSocket endpoint of the job-dispatch service.
    #[serde(default = "d_url")]
    pub url: String,
    /// Seconds to wait after a close before reconnecting. No backoff.
    #[serde(default = "d_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

impl OrchestratorConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            url: d_url(),
            reconnect_delay_secs: d_reconnect_delay_secs(),
        }
    }
}

fn d_url() -> String {
    DEFAULT_ORCHESTRATOR_URL.into()
}

fn d_reconnect_delay_secs() -> u64 {
    DEFAULT_RECONNECT_DELAY.as_secs()
}

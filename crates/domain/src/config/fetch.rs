use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Crawl fetches
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds. `None` leaves only the
    /// transport's own defaults in place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// `User-Agent` sent with every crawl request.
    #[serde(default = "d_user_agent")]
    pub user_agent: String,
}

impl FetchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            user_agent: d_user_agent(),
        }
    }
}

fn d_user_agent() -> String {
    concat!("sentinel-node/", env!("CARGO_PKG_VERSION")).into()
}

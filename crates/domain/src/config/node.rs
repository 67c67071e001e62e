use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Node identity
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeIdentityConfig {
    /// Pinned node id. When `None` a random id is generated at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Capability tags announced in the `register` handshake.
    #[serde(default = "d_capabilities")]
    pub capabilities: Vec<String>,
}

impl Default for NodeIdentityConfig {
    fn default() -> Self {
        Self {
            id: None,
            capabilities: d_capabilities(),
        }
    }
}

fn d_capabilities() -> Vec<String> {
    vec!["http".into(), "browser".into()]
}

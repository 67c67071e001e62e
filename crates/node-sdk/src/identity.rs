//! Stable node identity for the lifetime of the process.

use sentinel_domain::config::NodeIdentityConfig;
use uuid::Uuid;

const ID_PREFIX: &str = "sentinel_";
const ID_SUFFIX_LEN: usize = 9;

/// Node id plus the capability tags announced at registration.
///
/// Built once at startup and never mutated; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    id: String,
    capabilities: Vec<String>,
}

impl NodeIdentity {
    /// Fresh random id of the form `sentinel_<9 alphanumerics>`.
    pub fn generate<I, S>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let suffix: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(ID_SUFFIX_LEN)
            .collect();
        Self::with_id(format!("{ID_PREFIX}{suffix}"), capabilities)
    }

    /// Identity with a pinned id.  Duplicate capability tags are dropped,
    /// first occurrence wins.
    pub fn with_id<I, S>(id: impl Into<String>, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut caps: Vec<String> = Vec::new();
        for cap in capabilities {
            let cap = cap.into();
            if !caps.contains(&cap) {
                caps.push(cap);
            }
        }
        Self {
            id: id.into(),
            capabilities: caps,
        }
    }

    /// Pinned id from config if present, generated otherwise.
    pub fn from_config(cfg: &NodeIdentityConfig) -> Self {
        match cfg.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => Self::with_id(id, cfg.capabilities.iter().cloned()),
            None => Self::generate(cfg.capabilities.iter().cloned()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }
}

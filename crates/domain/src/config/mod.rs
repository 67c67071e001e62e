mod fetch;
mod keepalive;
mod logging;
mod node;
mod orchestrator;

pub use fetch::*;
pub use keepalive::*;
pub use logging::*;
pub use node::*;
pub use orchestrator::*;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Env var naming the config file path.
pub const CONFIG_PATH_ENV: &str = "SENTINEL_CONFIG";
/// Config file used when neither `--config` nor `SENTINEL_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "sentinel.toml";

/// Overrides `orchestrator.url`.
pub const ORCHESTRATOR_URL_ENV: &str = "SENTINEL_ORCHESTRATOR_URL";
/// Pins `node.id`.
pub const NODE_ID_ENV: &str = "SENTINEL_NODE_ID";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeConfig {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub keepalive: KeepAliveConfig,
    #[serde(default)]
    pub node: NodeIdentityConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NodeConfig {
    /// Read `path` if it exists (defaults otherwise), then apply the
    /// `SENTINEL_*` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            toml::from_str::<NodeConfig>(&raw)?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            NodeConfig::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ORCHESTRATOR_URL_ENV) {
            self.orchestrator.url = url;
        }
        if let Some(id) = get(NODE_ID_ENV) {
            self.node.id = Some(id);
        }
    }

    /// Validate and turn the first error-severity issue into an [`Error`].
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|e| e.severity == ConfigSeverity::Error)
        {
            Some(issue) => Err(Error::Config(issue.to_string())),
            None => Ok(()),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl NodeConfig {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let url = self.orchestrator.url.trim();
        if url.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "orchestrator.url".into(),
                message: "url must not be empty".into(),
            });
        } else if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "orchestrator.url".into(),
                message: format!("expected a ws:// or wss:// url, got {url:?}"),
            });
        }

        if self.orchestrator.reconnect_delay_secs == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "orchestrator.reconnect_delay_secs".into(),
                message: "reconnect delay must be greater than 0".into(),
            });
        }

        if self.keepalive.period_secs == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "keepalive.period_secs".into(),
                message: "keep-alive period must be greater than 0".into(),
            });
        }

        if let Some(id) = &self.node.id {
            if id.trim().is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: "node.id".into(),
                    message: "pinned node id must not be blank".into(),
                });
            }
        }

        if self.node.capabilities.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "node.capabilities".into(),
                message: "node advertises no capabilities".into(),
            });
        }

        if self.fetch.timeout_secs == Some(0) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "fetch.timeout_secs".into(),
                message: "a zero timeout fails every fetch; omit it to use the transport default"
                    .into(),
            });
        }

        errors
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let cfg = NodeConfig::default();
        assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
        assert!(cfg.ensure_valid().is_ok());
    }

    #[test]
    fn http_scheme_is_rejected() {
        let mut cfg = NodeConfig::default();
        cfg.orchestrator.url = "http://localhost:8000/ws/crawler".into();
        let issues = cfg.validate();
        assert!(issues
            .iter()
            .any(|e| e.field == "orchestrator.url" && e.severity == ConfigSeverity::Error));
        assert!(cfg.ensure_valid().is_err());
    }

    #[test]
    fn zero_durations_are_errors() {
        let mut cfg = NodeConfig::default();
        cfg.orchestrator.reconnect_delay_secs = 0;
        cfg.keepalive.period_secs = 0;
        let fields: Vec<_> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"orchestrator.reconnect_delay_secs".to_string()));
        assert!(fields.contains(&"keepalive.period_secs".to_string()));
    }

    #[test]
    fn empty_capabilities_is_only_a_warning() {
        let mut cfg = NodeConfig::default();
        cfg.node.capabilities.clear();
        let issues = cfg.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, ConfigSeverity::Warning);
        assert!(cfg.ensure_valid().is_ok());
    }

    #[test]
    fn overrides_replace_url_and_pin_id() {
        let env: HashMap<&str, &str> = [
            (ORCHESTRATOR_URL_ENV, "wss://hq.example.com/ws/crawler"),
            (NODE_ID_ENV, "sentinel_pinned"),
        ]
        .into_iter()
        .collect();

        let mut cfg = NodeConfig::default();
        cfg.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.orchestrator.url, "wss://hq.example.com/ws/crawler");
        assert_eq!(cfg.node.id.as_deref(), Some("sentinel_pinned"));
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut cfg = NodeConfig::default();
        cfg.apply_overrides(|_| Some("  ".into()));
        assert_eq!(cfg.orchestrator.url, DEFAULT_ORCHESTRATOR_URL);
        assert!(cfg.node.id.is_none());
    }

    #[test]
    fn display_tags_severity() {
        let e = ConfigError {
            severity: ConfigSeverity::Warning,
            field: "node.capabilities".into(),
            message: "none".into(),
        };
        assert_eq!(e.to_string(), "[WARN] node.capabilities: none");
    }
}

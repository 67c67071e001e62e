use std::path::Path;

use sentinel_domain::config::{ConfigSeverity, NodeConfig};

/// Validate the config and print what the node would run with.
///
/// Returns `false` when at least one error-severity issue was found.
pub fn validate(config: &NodeConfig, config_path: &Path) -> bool {
    let issues = config.validate();
    let errors = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();

    println!("config       {}", config_path.display());
    for line in summary(config) {
        println!("{line}");
    }

    if !issues.is_empty() {
        println!();
        for issue in &issues {
            println!("{issue}");
        }
    }

    if errors == 0 {
        println!("\nnode config OK ({} warning(s))", issues.len());
        true
    } else {
        println!("\nnode config rejected: {errors} error(s), {} warning(s)", issues.len() - errors);
        false
    }
}

/// The effective connection and identity settings, one per line.
fn summary(config: &NodeConfig) -> Vec<String> {
    let node_id = match config.node.id.as_deref() {
        Some(id) => id.to_string(),
        None => "(generated at startup)".to_string(),
    };
    let timeout = match config.fetch.timeout_secs {
        Some(secs) => format!("{secs}s"),
        None => "none".to_string(),
    };
    vec![
        format!("orchestrator {}", config.orchestrator.url),
        format!("reconnect    {}s", config.orchestrator.reconnect_delay_secs),
        format!("keepalive    {}s", config.keepalive.period_secs),
        format!("node_id      {node_id}"),
        format!("capabilities {}", config.node.capabilities.join(", ")),
        format!("fetch        timeout {timeout}, user-agent {}", config.fetch.user_agent),
    ]
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &NodeConfig) -> anyhow::Result<()> {
    let output = toml::to_string_pretty(config)
        .map_err(|e| anyhow::anyhow!("failed to serialize config: {e}"))?;
    print!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_shows_defaults() {
        let lines = summary(&NodeConfig::default());
        assert_eq!(lines[0], "orchestrator ws://localhost:8000/ws/crawler");
        assert_eq!(lines[1], "reconnect    5s");
        assert_eq!(lines[2], "keepalive    30s");
        assert_eq!(lines[3], "node_id      (generated at startup)");
        assert_eq!(lines[4], "capabilities http, browser");
        assert!(lines[5].starts_with("fetch        timeout none"));
    }

    #[test]
    fn summary_shows_pinned_id_and_timeout() {
        let mut config = NodeConfig::default();
        config.node.id = Some("sentinel_lab01".into());
        config.fetch.timeout_secs = Some(20);
        let lines = summary(&config);
        assert_eq!(lines[3], "node_id      sentinel_lab01");
        assert!(lines[5].starts_with("fetch        timeout 20s"));
    }

    #[test]
    fn validate_rejects_bad_url() {
        let mut config = NodeConfig::default();
        config.orchestrator.url = "http://localhost:8000/ws/crawler".into();
        assert!(!validate(&config, Path::new("sentinel.toml")));
        assert!(validate(&NodeConfig::default(), Path::new("sentinel.toml")));
    }
}

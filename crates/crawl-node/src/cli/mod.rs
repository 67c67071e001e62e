pub mod config;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sentinel_domain::config::{NodeConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};

/// Sentinel crawl node: connects to the orchestrator and runs crawl jobs.
#[derive(Debug, Parser)]
#[command(name = "sentinel-node", version, about)]
pub struct Cli {
    /// Config file (default: $SENTINEL_CONFIG, then sentinel.toml).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect and serve crawl jobs (default when no subcommand is given).
    Run,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print a freshly generated node identity.
    Identity,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

impl Cli {
    /// `--config`, then `SENTINEL_CONFIG`, then `sentinel.toml`.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| {
            std::env::var(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
        })
    }
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration shared by every subcommand.  A missing file
/// yields defaults; a malformed one is an error.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<NodeConfig> {
    NodeConfig::load(path).map_err(|e| anyhow::anyhow!("loading {}: {e}", path.display()))
}

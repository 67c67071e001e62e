//! Sentinel crawl node.
//!
//! Keeps one WebSocket connection to the orchestrator, registers, runs
//! `crawl_request` jobs and reports `crawl_result` / `crawl_error`.
//!
//! Usage:
//!   sentinel-node [--config sentinel.toml] [run]
//!   sentinel-node config validate|show
//!   sentinel-node identity
//!
//! Env vars:
//!   SENTINEL_CONFIG            — config file path (default: sentinel.toml)
//!   SENTINEL_ORCHESTRATOR_URL  — overrides orchestrator.url
//!   SENTINEL_NODE_ID           — pins the node id
//!   RUST_LOG                   — log filter (default: info,sentinel_node_sdk=debug)

mod cli;

use clap::Parser;
use sentinel_domain::config::{LogFormat, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config_path();

    match cli.command {
        None | Some(Command::Run) => {
            let config = cli::load_config(&config_path)?;
            init_tracing(&config.logging);
            cli::run::run(config).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let config = cli::load_config(&config_path)?;
            if !cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let config = cli::load_config(&config_path)?;
            cli::config::show(&config)
        }
        Some(Command::Identity) => {
            let config = cli::load_config(&config_path)?;
            cli::run::print_identity(&config);
            Ok(())
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sentinel_node_sdk=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

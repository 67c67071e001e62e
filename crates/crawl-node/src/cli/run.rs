use std::future::Future;

use sentinel_domain::config::NodeConfig;
use sentinel_node_sdk::{LinkStatus, NodeAgentBuilder, NodeIdentity};
use tokio_util::sync::CancellationToken;

/// Run the crawl node until Ctrl-C.
pub async fn run(config: NodeConfig) -> anyhow::Result<()> {
    config.ensure_valid()?;

    let agent = NodeAgentBuilder::from_config(&config).build()?;
    tracing::info!(
        orchestrator = %config.orchestrator.url,
        node_id = %agent.identity().id(),
        "configuration loaded"
    );

    let shutdown = CancellationToken::new();

    let mut status = agent.status();
    let status_shutdown = shutdown.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = status.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let now = *status.borrow_and_update();
                    match now {
                        LinkStatus::Connected => tracing::info!("orchestrator link: ON"),
                        LinkStatus::Disconnected => tracing::warn!("orchestrator link: OFF"),
                    }
                }
                _ = status_shutdown.cancelled() => break,
            }
        }
    });

    tokio::spawn(cancel_on_signal(tokio::signal::ctrl_c(), shutdown.clone()));

    agent.run(shutdown).await?;
    Ok(())
}

/// Cancel `shutdown` once `signal` fires.  If the listener cannot be
/// installed the node keeps running; it can still be stopped externally.
async fn cancel_on_signal<F>(signal: F, shutdown: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("received Ctrl-C");
            shutdown.cancel();
        }
        Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl-C, continuing without it"),
    }
}

/// Print a freshly generated identity using the configured capabilities.
pub fn print_identity(config: &NodeConfig) {
    let identity = NodeIdentity::generate(config.node.capabilities.iter().cloned());
    println!("node_id      {}", identity.id());
    println!("capabilities {}", identity.capabilities().join(", "));
}

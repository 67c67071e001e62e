//! The agent loop: owns the [`ConnectionManager`] and applies
//! [`AgentEvent`]s one at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::connection::ConnectionManager;
use crate::event::{event_channel, AgentEvent, EventReceiver, TransportEvent};
use crate::executor::JobExecutor;
use crate::identity::NodeIdentity;
use crate::keepalive::{self, KeepAliveScheduler};
use crate::reconnect::ReconnectPolicy;
use crate::registrar::Registrar;
use crate::transport::Connector;
use crate::types::{ConnectionState, LinkStatus, NodeSdkError};

/// How long shutdown waits for the close handshake.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// A fully-configured crawl node ready to run.
///
/// Create via [`NodeAgentBuilder`](crate::builder::NodeAgentBuilder).
pub struct NodeAgent {
    pub(crate) identity: Arc<NodeIdentity>,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) executor: Arc<dyn JobExecutor>,
    pub(crate) reconnect: ReconnectPolicy,
    pub(crate) keepalive: KeepAliveScheduler,
    pub(crate) status_tx: watch::Sender<LinkStatus>,
}

impl NodeAgent {
    /// Start a new builder.
    pub fn builder() -> crate::builder::NodeAgentBuilder {
        crate::builder::NodeAgentBuilder::new()
    }

    pub fn identity(&self) -> &Arc<NodeIdentity> {
        &self.identity
    }

    /// Subscribe to the connected/disconnected indicator.
    pub fn status(&self) -> watch::Receiver<LinkStatus> {
        self.status_tx.subscribe()
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Nothing inside the loop is fatal: transport failures are recovered
    /// by the reconnect timer and the keep-alive tick.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), NodeSdkError> {
        let (events_tx, mut events_rx) = event_channel();

        let mut manager = ConnectionManager::new(
            self.connector,
            self.executor,
            Registrar::new(self.identity.clone()),
            self.reconnect,
            events_tx.clone(),
            self.status_tx,
            shutdown.clone(),
        );

        tracing::info!(
            node_id = %self.identity.id(),
            capabilities = ?self.identity.capabilities(),
            keepalive_ms = self.keepalive.period().as_millis() as u64,
            reconnect_ms = self.reconnect.delay().as_millis() as u64,
            "crawl node starting"
        );

        let ticker = self.keepalive.spawn(events_tx, shutdown.clone());

        loop {
            tokio::select! {
                ev = events_rx.recv() => match ev {
                    Some(ev) => apply(&mut manager, ev),
                    // Unreachable while the manager holds a sender.
                    None => break,
                },
                _ = shutdown.cancelled() => {
                    tracing::info!(node_id = %self.identity.id(), "shutdown requested");
                    break;
                }
            }
        }

        ticker.abort();
        drain_close(&mut manager, &mut events_rx).await;
        tracing::info!(node_id = %self.identity.id(), "crawl node stopped");
        Ok(())
    }

    /// Same as [`run`](Self::run), but returns a `JoinHandle`.
    pub fn spawn(
        self,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<Result<(), NodeSdkError>> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}

/// Apply one event to the manager.
pub fn apply(manager: &mut ConnectionManager, event: AgentEvent) {
    match event {
        AgentEvent::Transport { conn, event } => manager.on_transport(conn, event),
        AgentEvent::Tick => {
            keepalive::on_tick(manager);
        }
        AgentEvent::ReconnectDue(conn) => {
            manager.on_reconnect_due(conn);
        }
        AgentEvent::JobFinished(msg) => {
            manager.send(msg);
        }
    }
}

/// Close the live connection and wait briefly for its close event.
async fn drain_close(manager: &mut ConnectionManager, events: &mut EventReceiver) {
    manager.close();
    if manager.state() != ConnectionState::Closing {
        return;
    }

    let settle = async {
        while let Some(ev) = events.recv().await {
            if let AgentEvent::Transport {
                conn,
                event: TransportEvent::Closed,
            } = ev
            {
                manager.on_transport(conn, TransportEvent::Closed);
                if manager.state() == ConnectionState::Disconnected {
                    return;
                }
            }
        }
    };
    if tokio::time::timeout(CLOSE_GRACE, settle).await.is_err() {
        tracing::warn!("orchestrator did not acknowledge close in time");
    }
}

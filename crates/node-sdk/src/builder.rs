//! Builder pattern for constructing a [`NodeAgent`].

use std::sync::Arc;
use std::time::Duration;

use sentinel_domain::config::{FetchConfig, NodeConfig, DEFAULT_ORCHESTRATOR_URL};
use tokio::sync::watch;

use crate::agent::NodeAgent;
use crate::executor::{CrawlExecutor, JobExecutor};
use crate::identity::NodeIdentity;
use crate::keepalive::KeepAliveScheduler;
use crate::reconnect::ReconnectPolicy;
use crate::transport::{Connector, WsConnector};
use crate::types::{LinkStatus, NodeSdkError};

/// Fluent builder for [`NodeAgent`].
///
/// # Example
///
/// ```rust,no_run
/// # use sentinel_node_sdk::{NodeAgentBuilder, NodeIdentity};
/// let agent = NodeAgentBuilder::new()
///     .orchestrator_url("ws://localhost:8000/ws/crawler")
///     .identity(NodeIdentity::generate(["http", "browser"]))
///     .reconnect_delay(std::time::Duration::from_secs(5))
///     .keepalive_period(std::time::Duration::from_secs(30))
///     .build()
///     .unwrap();
/// ```
pub struct NodeAgentBuilder {
    orchestrator_url: String,
    identity: Option<NodeIdentity>,
    reconnect_delay: Duration,
    keepalive_period: Duration,
    fetch: FetchConfig,
    connector: Option<Arc<dyn Connector>>,
    executor: Option<Arc<dyn JobExecutor>>,
}

impl NodeAgentBuilder {
    pub fn new() -> Self {
        Self {
            orchestrator_url: DEFAULT_ORCHESTRATOR_URL.into(),
            identity: None,
            reconnect_delay: ReconnectPolicy::default().delay(),
            keepalive_period: KeepAliveScheduler::default().period(),
            fetch: FetchConfig::default(),
            connector: None,
            executor: None,
        }
    }

    /// Seed every setting from a loaded [`NodeConfig`].
    pub fn from_config(config: &NodeConfig) -> Self {
        Self::new()
            .orchestrator_url(config.orchestrator.url.clone())
            .identity(NodeIdentity::from_config(&config.node))
            .reconnect_delay(config.orchestrator.reconnect_delay())
            .keepalive_period(config.keepalive.period())
            .fetch(config.fetch.clone())
    }

    // ── Connection ───────────────────────────────────────────────────

    /// Set the orchestrator WebSocket URL.
    pub fn orchestrator_url(mut self, url: impl Into<String>) -> Self {
        self.orchestrator_url = url.into();
        self
    }

    /// Fixed wait between a close and the next attempt (default 5s).
    pub fn reconnect_delay(mut self, d: Duration) -> Self {
        self.reconnect_delay = d;
        self
    }

    /// Keep-alive tick period (default 30s).
    pub fn keepalive_period(mut self, d: Duration) -> Self {
        self.keepalive_period = d;
        self
    }

    // ── Identity ─────────────────────────────────────────────────────

    /// Use this identity instead of a generated one.
    pub fn identity(mut self, identity: NodeIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    // ── Jobs ─────────────────────────────────────────────────────────

    /// HTTP settings for the default [`CrawlExecutor`].
    pub fn fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    // ── Overrides ────────────────────────────────────────────────────

    /// Replace the WebSocket transport.
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Replace the HTTP job executor.
    pub fn executor(mut self, executor: Arc<dyn JobExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Build the [`NodeAgent`].
    pub fn build(self) -> Result<NodeAgent, NodeSdkError> {
        if self.connector.is_none() && self.orchestrator_url.trim().is_empty() {
            return Err(NodeSdkError::Config("orchestrator_url is required".into()));
        }
        if self.reconnect_delay.is_zero() {
            return Err(NodeSdkError::Config("reconnect_delay must be non-zero".into()));
        }
        if self.keepalive_period.is_zero() {
            return Err(NodeSdkError::Config("keepalive_period must be non-zero".into()));
        }

        let identity = Arc::new(
            self.identity
                .unwrap_or_else(|| NodeIdentity::generate(["http", "browser"])),
        );

        let connector = match self.connector {
            Some(c) => c,
            None => Arc::new(WsConnector::new(self.orchestrator_url)),
        };
        let executor = match self.executor {
            Some(e) => e,
            None => Arc::new(CrawlExecutor::new(identity.id(), &self.fetch)?),
        };

        let (status_tx, _) = watch::channel(LinkStatus::Disconnected);

        Ok(NodeAgent {
            identity,
            connector,
            executor,
            reconnect: ReconnectPolicy::fixed(self.reconnect_delay),
            keepalive: KeepAliveScheduler::new(self.keepalive_period),
            status_tx,
        })
    }
}

impl Default for NodeAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

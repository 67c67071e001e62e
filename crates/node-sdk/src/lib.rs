//! `sentinel-node-sdk`: the crawl node agent.
//!
//! A crawl node keeps one WebSocket connection to the orchestrator,
//! registers itself, runs `crawl_request` jobs and reports their results.
//! The process may be suspended or killed at any time; the agent keeps no
//! state worth persisting and recovers purely by reconnecting.
//!
//! # Architecture
//!
//! ```text
//!  KeepAliveScheduler ──Tick──┐
//!  reconnect timer ──ReconnectDue─┤
//!  transport task ──Opened/Frame/Error/Closed─┤──► agent loop ──► ConnectionManager
//!  job tasks ──JobFinished────┘                       │
//!                                                     ├─ Registrar (on open)
//!                                                     └─ JobExecutor (per crawl_request)
//! ```
//!
//! Every input is an [`AgentEvent`] on one queue, and a single task owns
//! the [`ConnectionManager`].  Connection state is never shared.
//!
//! # Connection flow
//!
//! 1. Tick → `connect()`: no-op if Connecting/Open, else open a new attempt
//! 2. Open → status `connected`, send `register { node_id, capabilities }` once
//! 3. `crawl_request` → spawn a job; its `crawl_result` / `crawl_error` is
//!    sent if the connection is still open, dropped otherwise
//! 4. Tick while Open → `heartbeat`
//! 5. Close (any cause) → status `disconnected`, reconnect after a fixed delay

pub mod agent;
pub mod builder;
pub mod connection;
pub mod event;
pub mod executor;
pub mod identity;
pub mod keepalive;
pub mod reconnect;
pub mod registrar;
pub mod transport;
pub mod types;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use agent::NodeAgent;
pub use builder::NodeAgentBuilder;
pub use connection::ConnectionManager;
pub use event::{AgentEvent, TransportEvent};
pub use executor::{CrawlExecutor, JobExecutor};
pub use identity::NodeIdentity;
pub use keepalive::{KeepAliveScheduler, TickOutcome};
pub use reconnect::ReconnectPolicy;
pub use registrar::Registrar;
pub use transport::{ConnectionId, Connector, OutboundHandle, WsConnector};
pub use types::{ConnectionState, Job, LinkStatus, NodeSdkError};

// Re-export protocol types so nodes never need to import sentinel-protocol directly.
pub use sentinel_protocol::WsMessage;

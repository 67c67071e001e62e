//! Core types shared by the agent components: connection state, the
//! operator-visible link status, jobs, and errors.

use std::fmt;

/// Lifecycle state of the single logical orchestrator connection.
///
/// `Disconnected --connect()--> Connecting --open--> Open --close--> Disconnected`,
/// `Connecting --close--> Disconnected`, and `close()` moves an active
/// connection to `Closing` until its close event arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closing,
}

impl ConnectionState {
    /// Connecting or Open: a live connection exists and `connect()` must not
    /// start another one.
    pub fn is_active(self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
        };
        f.write_str(s)
    }
}

/// Two-state indicator for operators.  Not part of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStatus {
    Connected,
    #[default]
    Disconnected,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Connected => f.write_str("connected"),
            LinkStatus::Disconnected => f.write_str("disconnected"),
        }
    }
}

/// One crawl instruction.  Lives only for a single executor invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Correlation ID, echoed back in `crawl_result` / `crawl_error`.
    pub job_id: String,
    pub target_url: String,
}

/// Top-level SDK error.
#[derive(thiserror::Error, Debug)]
pub enum NodeSdkError {
    #[error("config: {0}")]
    Config(String),
    #[error("http client: {0}")]
    Http(String),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl From<sentinel_domain::Error> for NodeSdkError {
    fn from(e: sentinel_domain::Error) -> Self {
        match e {
            sentinel_domain::Error::Config(m) => NodeSdkError::Config(m),
            other => NodeSdkError::Other(anyhow::Error::new(other)),
        }
    }
}

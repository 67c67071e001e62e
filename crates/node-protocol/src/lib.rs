//! Crawl node protocol: WebSocket message types exchanged between a crawl
//! node and the orchestrator.
//!
//! Every frame is a flat JSON object whose `type` field selects the variant:
//!
//! | type            | direction             |
//! |-----------------|-----------------------|
//! | `register`      | node → orchestrator   |
//! | `heartbeat`     | node → orchestrator   |
//! | `crawl_request` | orchestrator → node   |
//! | `crawl_result`  | node → orchestrator   |
//! | `crawl_error`   | node → orchestrator   |

use serde::{Deserialize, Serialize};

/// Capability tag: plain HTTP fetches.
pub const CAPABILITY_HTTP: &str = "http";
/// Capability tag: fetches that look like they come from a browser.
pub const CAPABILITY_BROWSER: &str = "browser";

/// `Accept` header sent with every crawl fetch.
pub const CRAWL_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
/// `Cache-Control` header sent with every crawl fetch.
pub const CRAWL_CACHE_CONTROL: &str = "no-cache";

/// WebSocket message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Node → Orchestrator: one-time session bootstrap after connecting.
    Register {
        node_id: String,
        capabilities: Vec<String>,
    },

    /// Node → Orchestrator: liveness signal while connected.
    Heartbeat,

    /// Orchestrator → Node: fetch `url` and report back under `job_id`.
    CrawlRequest {
        job_id: String,
        url: String,
        /// Dispatch time stamped by the orchestrator.  Not used by the node.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },

    /// Node → Orchestrator: the fetch completed (any HTTP status).
    CrawlResult {
        job_id: String,
        url: String,
        status: u16,
        #[serde(rename = "html", alias = "body")]
        body: String,
        node_id: String,
    },

    /// Node → Orchestrator: the fetch failed below HTTP.
    CrawlError {
        job_id: String,
        url: String,
        error: String,
        node_id: String,
    },

    /// Any `type` this node does not know.  Never sent.
    #[serde(other)]
    Unknown,
}

impl WsMessage {
    /// The `type` discriminator as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            WsMessage::Register { .. } => "register",
            WsMessage::Heartbeat => "heartbeat",
            WsMessage::CrawlRequest { .. } => "crawl_request",
            WsMessage::CrawlResult { .. } => "crawl_result",
            WsMessage::CrawlError { .. } => "crawl_error",
            WsMessage::Unknown => "unknown",
        }
    }

    /// The job this message belongs to, if it is part of a crawl exchange.
    pub fn job_id(&self) -> Option<&str> {
        match self {
            WsMessage::CrawlRequest { job_id, .. }
            | WsMessage::CrawlResult { job_id, .. }
            | WsMessage::CrawlError { job_id, .. } => Some(job_id),
            _ => None,
        }
    }
}

//! Events consumed by the agent loop.
//!
//! Transport tasks, the keep-alive timer, reconnect timers and finished
//! jobs never touch connection state themselves; they post an
//! [`AgentEvent`] and the single agent task applies it.

use sentinel_protocol::WsMessage;
use tokio::sync::mpsc;

use crate::transport::ConnectionId;

/// Capacity of the agent event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

pub type EventSender = mpsc::Sender<AgentEvent>;
pub type EventReceiver = mpsc::Receiver<AgentEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::channel(EVENT_QUEUE_CAPACITY)
}

/// Something that happened on one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake finished; the connection can carry messages.
    Opened,
    /// One inbound text frame, undecoded.
    Frame(String),
    /// A transport failure.  Always followed by `Closed`.
    Error(String),
    /// The connection is gone, whatever the cause.  Emitted exactly once
    /// per connection attempt.
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    Transport {
        conn: ConnectionId,
        event: TransportEvent,
    },
    /// Keep-alive timer fired.
    Tick,
    /// The fixed reconnect delay after the close of this attempt has
    /// elapsed.
    ReconnectDue(ConnectionId),
    /// A crawl job produced its `crawl_result` or `crawl_error`.
    JobFinished(WsMessage),
}

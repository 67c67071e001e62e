//! Connection transports.
//!
//! A [`Connector`] starts one connection attempt and reports everything
//! that happens on it as [`TransportEvent`]s tagged with the attempt's
//! [`ConnectionId`].  Outbound messages go through the returned
//! [`OutboundHandle`]; dropping the handle closes the connection.

use futures_util::{SinkExt, StreamExt};
use sentinel_protocol::WsMessage;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::event::{AgentEvent, EventSender, TransportEvent};

/// Monotonic id of one connection attempt.
pub type ConnectionId = u64;

/// Sending half of one connection.
#[derive(Debug)]
pub struct OutboundHandle {
    tx: mpsc::UnboundedSender<WsMessage>,
}

impl OutboundHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WsMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue `msg` for the writer.  `false` if the connection task is gone.
    pub fn send(&self, msg: WsMessage) -> bool {
        self.tx.send(msg).is_ok()
    }
}

/// Starts connection attempts.
///
/// Implementations must emit exactly one [`TransportEvent::Closed`] per
/// call to [`open`](Connector::open), including when the attempt fails
/// before opening.
pub trait Connector: Send + Sync + 'static {
    fn open(&self, conn: ConnectionId, events: EventSender) -> OutboundHandle;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// WebSocket transport
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// [`Connector`] backed by `tokio-tungstenite`.  Each attempt runs in its
/// own task.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WsConnector {
    fn open(&self, conn: ConnectionId, events: EventSender) -> OutboundHandle {
        let (handle, outbound_rx) = OutboundHandle::channel();
        let url = self.url.clone();
        tokio::spawn(async move {
            drive_connection(url, conn, events.clone(), outbound_rx).await;
            let _ = emit(&events, conn, TransportEvent::Closed).await;
        });
        handle
    }
}

async fn emit(events: &EventSender, conn: ConnectionId, event: TransportEvent) -> bool {
    events
        .send(AgentEvent::Transport { conn, event })
        .await
        .is_ok()
}

/// Connect, then pump frames both ways until either side closes.
/// Returns without emitting `Closed`; the caller does that.
async fn drive_connection(
    url: String,
    conn: ConnectionId,
    events: EventSender,
    mut outbound_rx: mpsc::UnboundedReceiver<WsMessage>,
) {
    tracing::debug!(conn_id = conn, url = %url, "opening websocket");

    let ws = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            let _ = emit(&events, conn, TransportEvent::Error(e.to_string())).await;
            return;
        }
    };

    if !emit(&events, conn, TransportEvent::Opened).await {
        return;
    }

    let (mut sink, mut stream) = ws.split();
    let mut closing = false;

    loop {
        tokio::select! {
            out = outbound_rx.recv(), if !closing => match out {
                Some(msg) => {
                    let json = match serde_json::to_string(&msg) {
                        Ok(j) => j,
                        Err(e) => {
                            tracing::error!(error = %e, "failed to serialize outbound message");
                            continue;
                        }
                    };
                    if let Err(e) = sink.send(Message::Text(json)).await {
                        let _ = emit(&events, conn, TransportEvent::Error(e.to_string())).await;
                        break;
                    }
                }
                None => {
                    // Handle dropped: start the closing handshake and keep
                    // reading until the peer acknowledges.
                    closing = true;
                    if sink.send(Message::Close(None)).await.is_err() {
                        break;
                    }
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if !emit(&events, conn, TransportEvent::Frame(text)).await {
                        break;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(conn_id = conn, ?frame, "peer closed connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = emit(&events, conn, TransportEvent::Error(e.to_string())).await;
                    break;
                }
                None => break,
            },
        }
    }
}

//! The single logical orchestrator connection and its lifecycle.
//!
//! [`ConnectionManager`] is owned by the agent loop and mutated only from
//! there, one event at a time.  Everything else (transport tasks, timers,
//! jobs) talks to it through [`AgentEvent`]s.

use std::sync::Arc;

use sentinel_protocol::WsMessage;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::event::{AgentEvent, EventSender, TransportEvent};
use crate::executor::JobExecutor;
use crate::reconnect::ReconnectPolicy;
use crate::registrar::Registrar;
use crate::transport::{ConnectionId, Connector, OutboundHandle};
use crate::types::{ConnectionState, Job, LinkStatus};

pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    executor: Arc<dyn JobExecutor>,
    registrar: Registrar,
    reconnect: ReconnectPolicy,
    events: EventSender,
    status: watch::Sender<LinkStatus>,
    shutdown: CancellationToken,

    state: ConnectionState,
    /// Id of the attempt that owns `state`.  Events for any other id are stale.
    current: Option<ConnectionId>,
    next_id: ConnectionId,
    outbound: Option<OutboundHandle>,
}

impl ConnectionManager {
    pub fn new(
        connector: Arc<dyn Connector>,
        executor: Arc<dyn JobExecutor>,
        registrar: Registrar,
        reconnect: ReconnectPolicy,
        events: EventSender,
        status: watch::Sender<LinkStatus>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            connector,
            executor,
            registrar,
            reconnect,
            events,
            status,
            shutdown,
            state: ConnectionState::Disconnected,
            current: None,
            next_id: 1,
            outbound: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn node_id(&self) -> &str {
        self.registrar.identity().id()
    }

    /// Open a new connection unless one is already Connecting or Open.
    ///
    /// Returns `true` if an attempt was started.  Also a no-op while
    /// Closing: the pending close event settles the state first.
    pub fn connect(&mut self) -> bool {
        if self.state.is_active() {
            tracing::trace!(state = %self.state, "connect: already active, skipping");
            return false;
        }
        if self.state == ConnectionState::Closing {
            tracing::debug!("connect: close in progress, skipping");
            return false;
        }

        let conn = self.next_id;
        self.next_id += 1;

        tracing::info!(conn_id = conn, node_id = %self.node_id(), "connecting to orchestrator");
        self.outbound = Some(self.connector.open(conn, self.events.clone()));
        self.current = Some(conn);
        self.state = ConnectionState::Connecting;
        true
    }

    /// Deliver `msg` if the connection is Open, otherwise drop it.
    ///
    /// Returns whether the message was handed to the transport.
    pub fn send(&mut self, msg: WsMessage) -> bool {
        if self.state != ConnectionState::Open {
            tracing::debug!(
                kind = msg.kind(),
                job_id = msg.job_id().unwrap_or(""),
                state = %self.state,
                "dropping outbound message, connection not open"
            );
            return false;
        }
        match &self.outbound {
            Some(out) => out.send(msg),
            None => false,
        }
    }

    /// Begin closing the active connection.  Dropping the outbound handle
    /// makes the transport send a close frame; the close event that
    /// follows moves the state to Disconnected without scheduling a
    /// reconnect.
    pub fn close(&mut self) {
        if !self.state.is_active() {
            return;
        }
        tracing::info!(conn_id = ?self.current, "closing orchestrator connection");
        self.outbound = None;
        self.state = ConnectionState::Closing;
    }

    /// Apply one transport event.  Events from superseded attempts are
    /// ignored.
    pub fn on_transport(&mut self, conn: ConnectionId, event: TransportEvent) {
        if self.current != Some(conn) {
            tracing::debug!(conn_id = conn, current = ?self.current, "ignoring stale transport event");
            return;
        }

        match event {
            TransportEvent::Opened => self.on_open(conn),
            TransportEvent::Frame(text) => self.on_frame(conn, &text),
            TransportEvent::Error(error) => {
                // The close event that follows drives recovery.
                tracing::warn!(conn_id = conn, error = %error, "transport error");
            }
            TransportEvent::Closed => self.on_close(conn),
        }
    }

    fn on_open(&mut self, conn: ConnectionId) {
        if self.state != ConnectionState::Connecting {
            tracing::debug!(conn_id = conn, state = %self.state, "open event outside connecting");
            return;
        }
        self.state = ConnectionState::Open;
        self.set_status(LinkStatus::Connected);
        tracing::info!(conn_id = conn, "connected to orchestrator");

        if let Some(register) = self.registrar.register(conn) {
            self.send(register);
        }
    }

    fn on_close(&mut self, conn: ConnectionId) {
        let requested = self.state == ConnectionState::Closing;
        self.state = ConnectionState::Disconnected;
        self.outbound = None;
        self.set_status(LinkStatus::Disconnected);

        if requested {
            tracing::info!(conn_id = conn, "connection closed on request");
            return;
        }

        tracing::info!(
            conn_id = conn,
            delay_ms = self.reconnect.delay().as_millis() as u64,
            "disconnected, scheduling reconnect"
        );
        self.schedule_reconnect(conn);
    }

    /// The reconnect timer armed by the close of `conn` has fired.
    ///
    /// Only acts if `conn` is still the latest attempt and it is still
    /// Disconnected; a timer outlived by a newer attempt is ignored.
    pub fn on_reconnect_due(&mut self, conn: ConnectionId) -> bool {
        if self.current != Some(conn) || self.state != ConnectionState::Disconnected {
            tracing::debug!(
                conn_id = conn,
                current = ?self.current,
                state = %self.state,
                "ignoring stale reconnect timer"
            );
            return false;
        }
        self.connect()
    }

    fn on_frame(&mut self, conn: ConnectionId, text: &str) {
        match serde_json::from_str::<WsMessage>(text) {
            Ok(WsMessage::CrawlRequest { job_id, url, .. }) => {
                tracing::debug!(conn_id = conn, job_id = %job_id, url = %url, "received crawl_request");
                self.dispatch(Job {
                    job_id,
                    target_url: url,
                });
            }
            Ok(other) => {
                tracing::debug!(conn_id = conn, kind = other.kind(), "ignoring message");
            }
            Err(e) => {
                tracing::warn!(
                    conn_id = conn,
                    error = %e,
                    bytes = text.len(),
                    "dropping malformed inbound message"
                );
            }
        }
    }

    /// Run `job` on its own task.  Its single result message comes back as
    /// [`AgentEvent::JobFinished`].
    fn dispatch(&self, job: Job) {
        let executor = self.executor.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let job_id = job.job_id.clone();
            let msg = executor.execute(job).await;
            if events.send(AgentEvent::JobFinished(msg)).await.is_err() {
                tracing::debug!(job_id = %job_id, "agent stopped before job finished");
            }
        });
    }

    fn schedule_reconnect(&self, conn: ConnectionId) {
        // Deadline is fixed now, not when the task first runs.
        let sleep = tokio::time::sleep(self.reconnect.delay());
        let events = self.events.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = sleep => {
                    if events.send(AgentEvent::ReconnectDue(conn)).await.is_err() {
                        tracing::debug!(conn_id = conn, "agent stopped before reconnect timer fired");
                    }
                }
                _ = shutdown.cancelled() => {}
            }
        });
    }

    fn set_status(&self, status: LinkStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            tracing::info!(status = %status, "link status changed");
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

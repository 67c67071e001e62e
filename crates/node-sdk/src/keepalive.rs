//! Keep-alive timer: periodic reconnect check plus heartbeat.
//!
//! The scheduler never touches the connection.  It posts
//! [`AgentEvent::Tick`] into the agent queue and the loop calls
//! [`on_tick`].  Because `connect()` is idempotent, a tick is also the
//! recovery path for disconnects nobody noticed.

use std::time::Duration;

use sentinel_domain::config::DEFAULT_KEEPALIVE_PERIOD;
use sentinel_protocol::WsMessage;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::connection::ConnectionManager;
use crate::event::{AgentEvent, EventSender};
use crate::types::ConnectionState;

#[derive(Debug, Clone, Copy)]
pub struct KeepAliveScheduler {
    period: Duration,
}

impl Default for KeepAliveScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_KEEPALIVE_PERIOD)
    }
}

impl KeepAliveScheduler {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start ticking.  The first tick fires immediately so a fresh process
    /// connects at once.  Stops on `shutdown` or when the agent is gone.
    pub fn spawn(self, events: EventSender, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.period);
            // A suspended host resumes with one tick, not a burst.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if events.send(AgentEvent::Tick).await.is_err() {
                            break;
                        }
                    }
                    _ = shutdown.cancelled() => break,
                }
            }
            tracing::debug!("keep-alive scheduler stopped");
        })
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub connect_started: bool,
    pub heartbeat_sent: bool,
}

/// Handle a keep-alive tick: reconnect if needed, then heartbeat if Open.
pub fn on_tick(manager: &mut ConnectionManager) -> TickOutcome {
    let connect_started = manager.connect();
    let heartbeat_sent =
        manager.state() == ConnectionState::Open && manager.send(WsMessage::Heartbeat);
    tracing::trace!(connect_started, heartbeat_sent, "keep-alive tick");
    TickOutcome {
        connect_started,
        heartbeat_sent,
    }
}

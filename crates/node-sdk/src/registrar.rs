//! One-time registration handshake per connection.

use std::sync::Arc;

use sentinel_protocol::WsMessage;

use crate::identity::NodeIdentity;
use crate::transport::ConnectionId;

/// Builds the `register` message and remembers which connection it was
/// issued for, so a connection is never registered twice.
#[derive(Debug)]
pub struct Registrar {
    identity: Arc<NodeIdentity>,
    registered: Option<ConnectionId>,
}

impl Registrar {
    pub fn new(identity: Arc<NodeIdentity>) -> Self {
        Self {
            identity,
            registered: None,
        }
    }

    pub fn identity(&self) -> &Arc<NodeIdentity> {
        &self.identity
    }

    /// Registration for `conn`, or `None` if it was already issued for
    /// that connection.
    pub fn register(&mut self, conn: ConnectionId) -> Option<WsMessage> {
        if self.registered == Some(conn) {
            return None;
        }
        self.registered = Some(conn);
        Some(WsMessage::Register {
            node_id: self.identity.id().to_string(),
            capabilities: self.identity.capabilities().to_vec(),
        })
    }
}

//! Per-connection chat state machine
//!
//! `CONNECTED` (socket open, nobody joined) → `JOINED` (user bound) →
//! `CLOSED` (entry purged). The transport drives this through the
//! [`ConnectionEvents`] callbacks; [`ChatProtocol`] turns them into registry
//! updates and broadcasts.

use super::broadcaster::{Broadcaster, Outbound};
use super::events::{ClientMessage, PresenceChange, ServerMessage};
use crate::error::{ChatError, ChatResult};
use crate::registry::SessionRegistry;
use crate::types::{ConnectionId, Roster, User};

/// Lifecycle callbacks a transport endpoint invokes for each connection.
///
/// Calls for different connections may arrive concurrently from different
/// tasks.
pub trait ConnectionEvents: Send + Sync {
    fn on_connect(&self, conn: ConnectionId, outbound: Outbound);
    fn on_message(&self, conn: ConnectionId, frame: &str);
    fn on_disconnect(&self, conn: ConnectionId);
    fn on_error(&self, conn: ConnectionId, error: &(dyn std::error::Error + 'static));
}

/// Observable state of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Joined,
    Closed,
}

/// Registry + broadcaster glue
#[derive(Default)]
pub struct ChatProtocol {
    registry: SessionRegistry,
    broadcaster: Broadcaster,
}

impl ChatProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub fn roster(&self) -> Roster {
        self.registry.snapshot()
    }

    pub fn connection_state(&self, conn: ConnectionId) -> ConnectionState {
        if self.registry.user_for(conn).is_some() {
            ConnectionState::Joined
        } else if self.broadcaster.contains(conn) {
            ConnectionState::Connected
        } else {
            ConnectionState::Closed
        }
    }

    /// Apply one decoded client message
    pub fn handle(&self, conn: ConnectionId, message: ClientMessage) -> ChatResult<()> {
        match message {
            ClientMessage::Join(user) => self.join(conn, user),
            ClientMessage::Leave(user) => self.leave(conn, &user),
            ClientMessage::Text { user, data } => {
                self.publish(&ServerMessage::Text { user, data });
                Ok(())
            }
        }
    }

    fn join(&self, conn: ConnectionId, user: User) -> ChatResult<()> {
        let previous = self.registry.try_register(conn, user.clone())?;
        tracing::info!(conn_id = %conn, user = %user, rejoin = previous.is_some(), "User joined");

        if let Err(e) = self
            .broadcaster
            .send_to(conn, &ServerMessage::JoinAck(user.clone()))
        {
            tracing::warn!(conn_id = %conn, error = %e, "Failed to acknowledge join");
        }
        self.publish_presence(PresenceChange::Joined, user);
        Ok(())
    }

    /// Fails with `NotJoined` when no user named `user.name` is bound to
    /// `conn`; the registry is left untouched in that case.
    fn leave(&self, conn: ConnectionId, user: &User) -> ChatResult<()> {
        let removed = self
            .registry
            .unregister_named(conn, &user.name)
            .ok_or(ChatError::NotJoined(conn))?;
        tracing::info!(conn_id = %conn, user = %removed, "User left");
        self.publish_presence(PresenceChange::Left, removed);
        Ok(())
    }

    fn publish_presence(&self, change: PresenceChange, user: User) {
        let roster = self.registry.snapshot();
        self.publish(&ServerMessage::Presence {
            change,
            user,
            roster,
        });
    }

    fn publish(&self, message: &ServerMessage) {
        if let Err(e) = self.broadcaster.broadcast(message) {
            tracing::error!(error = %e, "Broadcast abandoned");
        }
    }

    fn reject(&self, conn: ConnectionId, error: &ChatError) {
        if !error.is_client_facing() {
            tracing::debug!(conn_id = %conn, error = %error, "Ignored client frame");
            return;
        }
        tracing::warn!(conn_id = %conn, error = %error, "Rejected client frame");
        if let Err(e) = self
            .broadcaster
            .send_to(conn, &ServerMessage::error(error.to_string()))
        {
            tracing::debug!(conn_id = %conn, error = %e, "Could not report error to client");
        }
    }
}

impl ConnectionEvents for ChatProtocol {
    fn on_connect(&self, conn: ConnectionId, outbound: Outbound) {
        self.broadcaster.add(conn, outbound);
        tracing::info!(conn_id = %conn, connections = self.broadcaster.connection_count(), "Connection opened");
    }

    fn on_message(&self, conn: ConnectionId, frame: &str) {
        tracing::debug!(conn_id = %conn, bytes = frame.len(), "Frame received");
        let result = ClientMessage::decode(frame).and_then(|message| self.handle(conn, message));
        if let Err(e) = result {
            self.reject(conn, &e);
        }
    }

    fn on_disconnect(&self, conn: ConnectionId) {
        self.broadcaster.remove(conn);
        if let Some(user) = self.registry.unregister(conn) {
            tracing::info!(conn_id = %conn, user = %user, "User disconnected");
            self.publish_presence(PresenceChange::Left, user);
        }
        tracing::info!(conn_id = %conn, connections = self.broadcaster.connection_count(), "Connection closed");
    }

    fn on_error(&self, conn: ConnectionId, error: &(dyn std::error::Error + 'static)) {
        tracing::warn!(conn_id = %conn, error = %error, "Transport error");
        self.on_disconnect(conn);
    }
}

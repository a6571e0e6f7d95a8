//! Error types for the chat server.

use thiserror::Error;

use crate::types::ConnectionId;

/// Result type for chat operations.
pub type ChatResult<T> = Result<T, ChatError>;

/// Failure to hand a frame to one connection's outbound queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The peer is not draining its queue fast enough; the frame was dropped.
    #[error("outbound queue full")]
    QueueFull,

    /// The connection's writer has gone away.
    #[error("connection closed")]
    Closed,
}

/// Errors raised while handling chat traffic.
///
/// None of these are fatal to the server; each is recovered at the connection
/// that caused it.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Frame is not valid JSON or names an unknown message type.
    #[error("malformed envelope: {0}")]
    Decode(#[source] serde_json::Error),

    /// Envelope parsed but a field its kind requires is absent or empty.
    #[error("{kind} requires {field}")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },

    /// Client sent a kind only the server may emit.
    #[error("{0} may not be sent by clients")]
    UnexpectedKind(&'static str),

    /// Outgoing payload could not be serialized.
    #[error("cannot encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// Send to a single connection failed.
    #[error("delivery to {conn_id} failed: {source}")]
    Delivery {
        conn_id: ConnectionId,
        #[source]
        source: DeliveryError,
    },

    /// Another live connection already holds this user name.
    #[error("user name '{0}' is already taken")]
    DuplicateName(String),

    /// Operation needs a joined user on this connection.
    #[error("{0} has not joined")]
    NotJoined(ConnectionId),
}

impl ChatError {
    /// Errors that are reported back to the sending client as an ERROR envelope
    pub fn is_client_facing(&self) -> bool {
        matches!(
            self,
            ChatError::Decode(_)
                | ChatError::MissingField { .. }
                | ChatError::UnexpectedKind(_)
                | ChatError::DuplicateName(_)
        )
    }
}

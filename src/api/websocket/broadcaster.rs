//! Fan-out of server messages to every open connection
//!
//! The broadcaster owns the active connection set. Each entry is the sending
//! half of that connection's bounded outbound queue, so a broadcast never
//! waits on a socket: it encodes once, copies the sink list under a read lock,
//! and then `try_send`s to each sink with the lock released.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use super::events::ServerMessage;
use crate::error::{ChatError, ChatResult, DeliveryError};
use crate::types::ConnectionId;

/// Non-blocking handle for pushing text frames to one connection
pub trait FrameSink: Send + Sync {
    fn try_send_frame(&self, frame: &str) -> Result<(), DeliveryError>;
}

impl FrameSink for mpsc::Sender<Message> {
    fn try_send_frame(&self, frame: &str) -> Result<(), DeliveryError> {
        self.try_send(Message::Text(frame.to_owned()))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => DeliveryError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
            })
    }
}

/// Shared sink handle stored in the active set
pub type Outbound = Arc<dyn FrameSink>;

/// Outcome of one broadcast call
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: Vec<(ConnectionId, DeliveryError)>,
}

/// Active connection set plus fan-out
pub struct Broadcaster {
    connections: RwLock<HashMap<ConnectionId, Outbound>>,
    sequence_counter: AtomicU64,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            sequence_counter: AtomicU64::new(0),
        }
    }

    /// Add a connection to the active set
    pub fn add(&self, conn: ConnectionId, sink: Outbound) {
        self.connections.write().insert(conn, sink);
    }

    /// Drop a connection from the active set. Returns whether it was present.
    pub fn remove(&self, conn: ConnectionId) -> bool {
        self.connections.write().remove(&conn).is_some()
    }

    pub fn contains(&self, conn: ConnectionId) -> bool {
        self.connections.read().contains_key(&conn)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }

    /// Number of broadcasts performed so far
    pub fn current_sequence_id(&self) -> u64 {
        self.sequence_counter.load(Ordering::SeqCst)
    }

    /// Send one message to a single connection
    pub fn send_to(&self, conn: ConnectionId, message: &ServerMessage) -> ChatResult<()> {
        let frame = message.encode()?;
        let sink = self.connections.read().get(&conn).cloned();
        let sink = sink.ok_or(ChatError::Delivery {
            conn_id: conn,
            source: DeliveryError::Closed,
        })?;
        sink.try_send_frame(&frame).map_err(|source| ChatError::Delivery {
            conn_id: conn,
            source,
        })
    }

    /// Deliver one message to every connection in the active set.
    ///
    /// Encodes once. A failed send is logged and skipped; it never stops the
    /// remaining deliveries. Connections whose writer has gone are pruned
    /// from the active set afterwards.
    pub fn broadcast(&self, message: &ServerMessage) -> ChatResult<BroadcastReport> {
        let frame = message.encode()?;
        let seq = self.sequence_counter.fetch_add(1, Ordering::SeqCst);

        let recipients: Vec<(ConnectionId, Outbound)> = self
            .connections
            .read()
            .iter()
            .map(|(id, sink)| (*id, sink.clone()))
            .collect();

        let mut report = BroadcastReport::default();
        for (conn, sink) in recipients {
            match sink.try_send_frame(&frame) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(conn_id = %conn, seq, error = %e, "Broadcast delivery failed");
                    report.failed.push((conn, e));
                }
            }
        }

        let closed: Vec<ConnectionId> = report
            .failed
            .iter()
            .filter(|(_, e)| *e == DeliveryError::Closed)
            .map(|(id, _)| *id)
            .collect();
        if !closed.is_empty() {
            let mut connections = self.connections.write();
            for id in closed {
                connections.remove(&id);
            }
        }

        tracing::debug!(seq, delivered = report.delivered, failed = report.failed.len(), "Broadcast sent");
        Ok(report)
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

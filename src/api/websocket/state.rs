//! WebSocket application state

use chrono::{DateTime, Utc};

use super::protocol::ChatProtocol;
use crate::config::ServerConfig;
use crate::types::{ConnectionId, ConnectionIdGenerator};

/// Shared application state for WebSocket connections
pub struct AppState {
    /// Registry, active connection set and message handling
    pub protocol: ChatProtocol,

    /// Runtime settings
    pub config: ServerConfig,

    /// Source of connection handles
    pub connection_ids: ConnectionIdGenerator,

    /// When this server instance started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            protocol: ChatProtocol::new(),
            config,
            connection_ids: ConnectionIdGenerator::new(),
            started_at: Utc::now(),
        }
    }

    /// Mint a handle for a newly accepted socket
    pub fn next_connection_id(&self) -> ConnectionId {
        self.connection_ids.next_id()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

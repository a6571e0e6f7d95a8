//! REST API module for HTTP endpoints
//!
//! Read-only views of the chat server for operators and clients that want the
//! roster without opening a socket:
//! - `GET /api/roster` - Currently joined users
//! - `GET /api/stats` - Connection counts and uptime

pub mod roster;
pub mod stats;

use serde::Serialize;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Broadcast sequence at the time of the read
    pub sequence_id: u64,
}

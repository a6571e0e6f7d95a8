//! Server statistics endpoint

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use super::ApiResponse;
use crate::api::websocket::state::AppState;

/// Response body for GET /api/stats
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Open sockets, joined or not
    pub connections: usize,
    /// Connections with a bound user
    pub joined: usize,
    /// Distinct users in the roster
    pub users: usize,
    /// RFC 3339 start time
    pub started_at: String,
    pub uptime_secs: i64,
}

/// GET /api/stats - Connection and roster counts
pub async fn get_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let protocol = &state.protocol;
    let uptime = chrono::Utc::now() - state.started_at;

    Json(ApiResponse {
        data: StatsResponse {
            connections: protocol.broadcaster().connection_count(),
            joined: protocol.registry().len(),
            users: protocol.roster().len(),
            started_at: state.started_at.to_rfc3339(),
            uptime_secs: uptime.num_seconds(),
        },
        sequence_id: protocol.broadcaster().current_sequence_id(),
    })
}

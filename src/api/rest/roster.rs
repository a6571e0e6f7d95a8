//! Roster endpoint

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};

use super::ApiResponse;
use crate::api::websocket::state::AppState;
use crate::types::User;

/// GET /api/roster - Users currently joined, sorted by name
pub async fn get_roster(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let users: Vec<User> = state.protocol.roster().into_iter().collect();
    Json(ApiResponse {
        data: users,
        sequence_id: state.protocol.broadcaster().current_sequence_id(),
    })
}

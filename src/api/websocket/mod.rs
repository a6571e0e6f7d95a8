//! WebSocket module for the chat endpoint
//!
//! Provides the `/ws` endpoint where clients join, chat and leave.
//!
//! ## Pieces
//! - `events`: wire envelope and typed messages
//! - `broadcaster`: active connection set and fan-out
//! - `protocol`: per-connection state machine
//! - `handler`: axum socket plumbing

pub mod broadcaster;
pub mod events;
pub mod handler;
pub mod protocol;
pub mod state;

// Re-export commonly used items
pub use broadcaster::{BroadcastReport, Broadcaster, FrameSink, Outbound};
pub use events::{ClientMessage, Envelope, MessageType, PresenceChange, ServerMessage};
pub use protocol::{ChatProtocol, ConnectionEvents, ConnectionState};
pub use state::AppState;

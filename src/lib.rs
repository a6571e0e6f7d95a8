//! Broadcast Chat Server
//!
//! A real-time chat server: clients connect over WebSocket, join with a user
//! name, exchange text messages and leave. Every message is fanned out to all
//! connected clients, and every join/leave broadcasts the refreshed roster.
//!
//! # Features
//!
//! - **Thread-Safe Registry**: connection → user mapping behind a single lock
//! - **Non-blocking Fan-out**: per-connection bounded outbound queues
//! - **Typed Protocol**: wire envelope narrowed to typed messages at decode time
//! - **Error Envelopes**: malformed frames get an `ERROR` reply, not silence
//!
//! # Modules
//!
//! - `types`: Core identity types (User, ConnectionId, Roster)
//! - `registry`: Session registry
//! - `api`: WebSocket protocol, broadcaster and HTTP router
//! - `config`: Environment-driven settings
//! - `error`: Error taxonomy
//! - `logging`: Tracing setup
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use broadcast_chat::{create_router, AppState, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::from_env();
//!     let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
//!     let app = create_router(Arc::new(AppState::new(config)));
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod types;

// Re-export commonly used items at crate root
pub use api::http::create_router;
pub use api::websocket::{
    AppState, Broadcaster, ChatProtocol, ClientMessage, ConnectionEvents, ConnectionState,
    Envelope, MessageType, ServerMessage,
};
pub use config::ServerConfig;
pub use error::{ChatError, ChatResult, DeliveryError};
pub use registry::SessionRegistry;
pub use types::{ConnectionId, Roster, User};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

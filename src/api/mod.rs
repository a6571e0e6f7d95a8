//! API module for HTTP and WebSocket endpoints
//!
//! The WebSocket endpoint carries all chat traffic; the REST endpoints expose
//! read-only views of the same state.

pub mod http;
pub mod rest;
pub mod websocket;

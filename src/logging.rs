//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_LOG_FILTER: &str = "broadcast_chat=info,chat_server=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber. JSON output is meant for container logs.
///
/// Calling this twice is harmless; the second call leaves the first subscriber
/// in place.
pub fn init(json: bool) {
    let result = if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }
}

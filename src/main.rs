//! Broadcast Chat Server - Binary Entry Point
//!
//! Reads settings from the environment (`PORT`, default 9000) and serves the
//! chat WebSocket at `/ws` until Ctrl+C or SIGTERM.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;

use broadcast_chat::{create_router, logging, AppState, ServerConfig};

type MainResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> MainResult<()> {
    let config = ServerConfig::from_env();
    logging::init(config.json_logs);

    tracing::info!(
        "{} v{} starting",
        broadcast_chat::NAME,
        broadcast_chat::VERSION
    );

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut shutdown_tx = Some(shutdown_tx);
    ctrlc::set_handler(move || {
        if let Some(tx) = shutdown_tx.take() {
            let _ = tx.send(());
        }
    })?;

    let addr = config.listen_addr();
    let state = Arc::new(AppState::new(config));
    let app = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

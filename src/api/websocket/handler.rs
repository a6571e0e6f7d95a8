//! WebSocket connection handler
//!
//! Each socket is split into a reader loop, which feeds frames to the chat
//! protocol, and a writer task that drains the connection's bounded outbound
//! queue. Broadcasts only ever touch the queue, so a slow peer stalls nobody
//! but itself.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout;

use super::protocol::ConnectionEvents;
use super::state::AppState;
use crate::types::ConnectionId;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let conn = state.next_connection_id();
    let protocol = &state.protocol;

    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::channel::<Message>(state.config.outbound_capacity);

    protocol.on_connect(conn, Arc::new(tx.clone()));
    let mut writer = tokio::spawn(writer_task(ws_sender, rx, state.config.send_timeout, conn));

    let mut errored = false;
    loop {
        tokio::select! {
            _ = &mut writer => {
                tracing::debug!(conn_id = %conn, "Writer stopped, closing connection");
                break;
            }

            incoming = ws_receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => protocol.on_message(conn, &text),
                    Some(Ok(Message::Binary(_))) => {
                        tracing::debug!(conn_id = %conn, "Ignoring binary frame");
                    }
                    Some(Ok(Message::Ping(data))) => {
                        queue_pong(&tx, data, conn);
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(frame))) => {
                        tracing::debug!(conn_id = %conn, reason = ?frame, "Client initiated close");
                        break;
                    }
                    Some(Err(e)) => {
                        protocol.on_error(conn, &e);
                        errored = true;
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    if !errored {
        protocol.on_disconnect(conn);
    }
    writer.abort();
}

/// Answer a client ping through the outbound queue. Returns whether it was queued.
fn queue_pong(tx: &mpsc::Sender<Message>, data: Vec<u8>, conn: ConnectionId) -> bool {
    match tx.try_send(Message::Pong(data)) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(conn_id = %conn, error = %e, "Dropped pong");
            false
        }
    }
}

/// Forward queued frames to the socket, giving up on a write that stalls.
///
/// The queue is dropped before the close handshake, and the close is bounded
/// by the same timeout as a write.
async fn writer_task(
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Message>,
    send_timeout: Duration,
    conn: ConnectionId,
) {
    while let Some(msg) = rx.recv().await {
        match timeout(send_timeout, ws_sender.send(msg)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(conn_id = %conn, error = %e, "Socket write failed");
                break;
            }
            Err(_) => {
                tracing::warn!(conn_id = %conn, timeout_ms = send_timeout.as_millis() as u64, "Socket write timed out");
                break;
            }
        }
    }
    drop(rx);
    if timeout(send_timeout, ws_sender.close()).await.is_err() {
        tracing::debug!(conn_id = %conn, "Socket close timed out");
    }
}

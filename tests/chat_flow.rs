//! Integration tests: real server on a loopback port, tungstenite clients

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use broadcast_chat::{create_router, AppState, ServerConfig, ServerMessage, User};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Start the server on a random port and return its address and state
async fn start_test_server() -> (SocketAddr, Arc<AppState>) {
    start_test_server_with(ServerConfig::default()).await
}

async fn start_test_server_with(config: ServerConfig) -> (SocketAddr, Arc<AppState>) {
    let state = Arc::new(AppState::new(config));
    let app = create_router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

async fn connect(addr: SocketAddr, state: &AppState, expected_connections: usize) -> Client {
    let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();
    wait_until(|| state.protocol.broadcaster().connection_count() == expected_connections).await;
    client
}

async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

async fn send(client: &mut Client, frame: Value) {
    client.send(Message::text(frame.to_string())).await.unwrap();
}

/// Next text frame as JSON, skipping control frames
async fn recv(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("socket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Assert nothing arrives for a short while
async fn expect_silence(client: &mut Client) {
    let result = tokio::time::timeout(Duration::from_millis(150), client.next()).await;
    assert!(result.is_err(), "unexpected frame: {result:?}");
}

fn roster_names(envelope: &Value) -> Vec<String> {
    let data = envelope["data"].as_str().unwrap();
    let users: Vec<Value> = serde_json::from_str(data).unwrap();
    users
        .iter()
        .map(|u| u["name"].as_str().unwrap().to_string())
        .collect()
}

fn join(name: &str) -> Value {
    json!({"type": "USER_JOINED", "user": {"name": name, "id": null}, "data": null})
}

#[tokio::test]
async fn test_join_text_and_abrupt_disconnect() {
    let (addr, state) = start_test_server().await;
    let mut a = connect(addr, &state, 1).await;
    let mut b = connect(addr, &state, 2).await;
    let mut c = connect(addr, &state, 3).await;

    send(&mut a, join("alice")).await;
    let ack = recv(&mut a).await;
    assert_eq!(ack["type"], "USER_JOINED_ACK");
    assert_eq!(ack["user"]["name"], "alice");
    for client in [&mut a, &mut b, &mut c] {
        let presence = recv(client).await;
        assert_eq!(presence["type"], "USER_JOINED");
        assert_eq!(roster_names(&presence), vec!["alice"]);
    }

    send(&mut b, join("bob")).await;
    let ack = recv(&mut b).await;
    assert_eq!(ack["type"], "USER_JOINED_ACK");
    assert_eq!(ack["user"]["name"], "bob");
    for client in [&mut a, &mut b, &mut c] {
        let presence = recv(client).await;
        assert_eq!(roster_names(&presence), vec!["alice", "bob"]);
    }

    send(
        &mut a,
        json!({"type": "TEXT_MESSAGE", "user": {"name": "alice", "id": null}, "data": "hi"}),
    )
    .await;
    for client in [&mut a, &mut b, &mut c] {
        let text = recv(client).await;
        assert_eq!(text["type"], "TEXT_MESSAGE");
        assert_eq!(text["user"]["name"], "alice");
        assert_eq!(text["data"], "hi");
    }

    // Drop B without a LEAVE
    drop(b);
    wait_until(|| state.protocol.registry().len() == 1).await;
    for client in [&mut a, &mut c] {
        let presence = recv(client).await;
        assert_eq!(presence["type"], "USER_LEFT");
        assert_eq!(roster_names(&presence), vec!["alice"]);
    }

    send(&mut c, join("carol")).await;
    assert_eq!(recv(&mut c).await["type"], "USER_JOINED_ACK");
    let presence = recv(&mut a).await;
    assert_eq!(roster_names(&presence), vec!["alice", "carol"]);
}

#[tokio::test]
async fn test_malformed_frame_then_valid_frame() {
    let (addr, state) = start_test_server().await;
    let mut a = connect(addr, &state, 1).await;
    let mut b = connect(addr, &state, 2).await;

    a.send(Message::text("{this is not json")).await.unwrap();
    let error = recv(&mut a).await;
    assert_eq!(error["type"], "ERROR");
    assert!(error["user"].is_null());
    expect_silence(&mut b).await;

    send(&mut a, join("alice")).await;
    assert_eq!(recv(&mut a).await["type"], "USER_JOINED_ACK");
    assert_eq!(recv(&mut b).await["type"], "USER_JOINED");
}

#[tokio::test]
async fn test_leave_broadcasts_updated_roster() {
    let (addr, state) = start_test_server().await;
    let mut a = connect(addr, &state, 1).await;
    let mut b = connect(addr, &state, 2).await;

    send(&mut a, join("alice")).await;
    recv(&mut a).await;
    recv(&mut a).await;
    recv(&mut b).await;

    send(&mut a, json!({"type": "USER_LEFT", "user": {"name": "alice"}})).await;
    for client in [&mut a, &mut b] {
        let presence = recv(client).await;
        assert_eq!(presence["type"], "USER_LEFT");
        assert!(roster_names(&presence).is_empty());
    }
    assert!(state.protocol.roster().is_empty());
    assert_eq!(state.protocol.broadcaster().connection_count(), 2);
}

#[tokio::test]
async fn test_duplicate_name_gets_error() {
    let (addr, state) = start_test_server().await;
    let mut a = connect(addr, &state, 1).await;
    let mut b = connect(addr, &state, 2).await;

    send(&mut a, join("alice")).await;
    recv(&mut a).await;
    recv(&mut a).await;
    recv(&mut b).await;

    send(&mut b, join("alice")).await;
    let error = recv(&mut b).await;
    assert_eq!(error["type"], "ERROR");
    assert!(error["data"].as_str().unwrap().contains("alice"));
    expect_silence(&mut a).await;
    assert_eq!(state.protocol.registry().len(), 1);
}

#[tokio::test]
async fn test_stalled_reader_is_torn_down() {
    let config = ServerConfig {
        outbound_capacity: 4,
        send_timeout: Duration::from_millis(200),
        ..ServerConfig::default()
    };
    let (addr, state) = start_test_server_with(config).await;
    let mut a = connect(addr, &state, 1).await;
    let mut b = connect(addr, &state, 2).await;

    send(&mut a, join("alice")).await;
    recv(&mut a).await;
    recv(&mut a).await;
    recv(&mut b).await;
    send(&mut b, join("bob")).await;
    recv(&mut a).await;
    wait_until(|| state.protocol.registry().len() == 2).await;

    // Alice keeps reading in the background; Bob never reads again
    let (presence_tx, mut presence_rx) = tokio::sync::mpsc::unbounded_channel::<Value>();
    let (_a_sink, mut a_stream) = a.split();
    tokio::spawn(async move {
        while let Some(Ok(msg)) = a_stream.next().await {
            // Flood frames are large; only presence updates are small
            if let Message::Text(text) = msg {
                if text.len() < 64 * 1024 {
                    let value: Value = serde_json::from_str(text.as_str()).unwrap();
                    let _ = presence_tx.send(value);
                }
            }
        }
    });

    let payload = "x".repeat(1024 * 1024);
    let flood = ServerMessage::Text {
        user: Some(User::new("alice")),
        data: payload,
    };
    for _ in 0..400 {
        if state.protocol.broadcaster().connection_count() == 1 {
            break;
        }
        state.protocol.broadcaster().broadcast(&flood).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    wait_until(|| state.protocol.broadcaster().connection_count() == 1).await;
    wait_until(|| state.protocol.registry().len() == 1).await;
    let names: Vec<String> = state.protocol.roster().into_iter().map(|u| u.name).collect();
    assert_eq!(names, vec!["alice"]);

    let left = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let value = presence_rx.recv().await.expect("alice stream ended");
            if value["type"] == "USER_LEFT" {
                return value;
            }
        }
    })
    .await
    .expect("alice never saw bob leave");
    assert_eq!(left["user"]["name"], "bob");
    assert_eq!(roster_names(&left), vec!["alice"]);

    drop(b);
}

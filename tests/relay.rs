//! End-to-end tests over real WebSocket connections.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use room_relay::{EventKind, OutboundEvent, RelayConfig, RelayServer, RelayState, RoomName};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const READ_TIMEOUT: Duration = Duration::from_secs(2);

async fn start_server() -> (String, RelayState) {
    start_server_with(RelayConfig::default()).await
}

async fn start_server_with(config: RelayConfig) -> (String, RelayState) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server = RelayServer::with_listener(listener, &config);
    let url = format!("ws://{}/ws", server.local_addr().unwrap());
    let state = server.state().clone();
    tokio::spawn(server.run());
    (url, state)
}

async fn connect(url: &str) -> Ws {
    let (ws, _) = connect_async(url).await.expect("Failed to connect");
    ws
}

async fn send(ws: &mut Ws, room: &str, action: &str, content: &str) {
    let json = serde_json::json!({
        "room_name": room,
        "action": action,
        "content": content,
    });
    ws.send(Message::Text(json.to_string().into())).await.unwrap();
}

async fn recv(ws: &mut Ws) -> OutboundEvent {
    loop {
        let frame = tokio::time::timeout(READ_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for event")
            .expect("Connection closed")
            .expect("WebSocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("Invalid event JSON");
        }
    }
}

async fn assert_silent(ws: &mut Ws) {
    let result = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(result.is_err(), "unexpected frame: {:?}", result);
}

#[tokio::test]
async fn test_lobby_scenario() {
    let (url, _state) = start_server().await;
    let mut conn1 = connect(&url).await;
    let mut conn2 = connect(&url).await;

    send(&mut conn1, "lobby", "create_room", "").await;
    assert_eq!(recv(&mut conn1).await.content, "created room with name lobby");

    send(&mut conn1, "lobby", "join_room", "").await;
    assert_eq!(recv(&mut conn1).await.content, "Joined room:lobby");

    send(&mut conn2, "lobby", "join_room", "").await;
    let joined = recv(&mut conn2).await;
    assert_eq!(joined.kind, EventKind::Info);
    assert_eq!(joined.content, "Joined room:lobby");

    send(&mut conn1, "lobby", "send_message", "hi").await;
    let expected = OutboundEvent::text(RoomName::from("lobby"), "hi");
    assert_eq!(recv(&mut conn1).await, expected);
    assert_eq!(recv(&mut conn2).await, expected);

    send(&mut conn2, "lobby", "leave_room", "").await;
    assert_eq!(recv(&mut conn2).await.content, "Left room:lobby");

    send(&mut conn1, "lobby", "send_message", "bye").await;
    assert_eq!(
        recv(&mut conn1).await,
        OutboundEvent::text(RoomName::from("lobby"), "bye")
    );
    assert_silent(&mut conn2).await;
}

#[tokio::test]
async fn test_wire_format() {
    let (url, _state) = start_server().await;
    let mut conn = connect(&url).await;

    send(&mut conn, "room", "create_room", "").await;
    let frame = tokio::time::timeout(READ_TIMEOUT, conn.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let value: serde_json::Value = match frame {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected text frame, got {:?}", other),
    };

    assert_eq!(value["type"], "info");
    assert_eq!(value["room_name"], "room");
    assert_eq!(value["content"], "created room with name room");
}

#[tokio::test]
async fn test_duplicate_room_and_missing_room() {
    let (url, _state) = start_server().await;
    let mut conn = connect(&url).await;

    send(&mut conn, "lobby", "create_room", "").await;
    recv(&mut conn).await;
    send(&mut conn, "lobby", "create_room", "").await;
    assert_eq!(recv(&mut conn).await.content, "room `lobby` already exists");

    send(&mut conn, "attic", "join_room", "").await;
    assert_eq!(recv(&mut conn).await.content, "room `attic` not found");
}

#[tokio::test]
async fn test_unknown_action() {
    let (url, _state) = start_server().await;
    let mut conn = connect(&url).await;

    send(&mut conn, "lobby", "dance", "").await;
    let event = recv(&mut conn).await;
    assert_eq!(event.kind, EventKind::Info);
    assert_eq!(event.content, "unknown action: dance");
}

#[tokio::test]
async fn test_send_without_joining_is_dropped() {
    let (url, _state) = start_server().await;
    let mut member = connect(&url).await;
    let mut outsider = connect(&url).await;

    send(&mut member, "lobby", "create_room", "").await;
    recv(&mut member).await;
    send(&mut member, "lobby", "join_room", "").await;
    recv(&mut member).await;

    send(&mut outsider, "lobby", "send_message", "psst").await;
    assert_silent(&mut member).await;
    assert_silent(&mut outsider).await;
}

#[tokio::test]
async fn test_malformed_payload_closes_connection() {
    let (url, _state) = start_server().await;
    let mut conn = connect(&url).await;

    conn.send(Message::Text("not json".to_string().into()))
        .await
        .unwrap();

    loop {
        let next = tokio::time::timeout(READ_TIMEOUT, conn.next())
            .await
            .expect("Connection was not closed");
        match next {
            Some(Ok(Message::Text(text))) => panic!("unexpected event: {}", text),
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
            Some(Ok(_)) => continue,
        }
    }
}

#[tokio::test]
async fn test_disconnect_removes_membership() {
    let (url, state) = start_server().await;
    let mut conn1 = connect(&url).await;
    let mut conn2 = connect(&url).await;

    send(&mut conn1, "lobby", "create_room", "").await;
    recv(&mut conn1).await;
    for conn in [&mut conn1, &mut conn2] {
        send(conn, "lobby", "join_room", "").await;
        recv(conn).await;
    }

    let room = state.directory.find_room(&RoomName::from("lobby")).await.unwrap();
    assert_eq!(room.participant_count().await, 2);

    conn2.close(None).await.unwrap();
    drop(conn2);

    let mut remaining = 2;
    for _ in 0..50 {
        remaining = room.participant_count().await;
        if remaining == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(remaining, 1);

    send(&mut conn1, "lobby", "send_message", "still here").await;
    assert_eq!(recv(&mut conn1).await.content, "still here");
}

#[tokio::test]
async fn test_stalled_connection_is_closed() {
    let config = RelayConfig {
        outbound_buffer: 1,
        delivery_timeout: Duration::from_millis(500),
        ..RelayConfig::default()
    };
    let (url, state) = start_server_with(config).await;
    let mut active = connect(&url).await;
    let mut stalled = connect(&url).await;

    send(&mut active, "lobby", "create_room", "").await;
    recv(&mut active).await;
    for conn in [&mut active, &mut stalled] {
        send(conn, "lobby", "join_room", "").await;
        recv(conn).await;
    }

    // Keep the active side reading its own echoes; the stalled side never reads.
    let (mut active_tx, mut active_rx) = active.split();
    let drain = tokio::spawn(async move {
        let mut received = 0;
        while let Some(Ok(frame)) = active_rx.next().await {
            if frame.is_text() {
                received += 1;
            }
        }
        received
    });

    let payload = "x".repeat(256 * 1024);
    for _ in 0..96 {
        let json = serde_json::json!({
            "room_name": "lobby",
            "action": "send_message",
            "content": payload,
        });
        active_tx
            .send(Message::Text(json.to_string().into()))
            .await
            .unwrap();
    }

    let room = state.directory.find_room(&RoomName::from("lobby")).await.unwrap();
    let mut remaining = 2;
    for _ in 0..200 {
        remaining = room.participant_count().await;
        if remaining == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(remaining, 1, "stalled participant was not removed");

    // Whatever was buffered drains, then the server side is gone.
    let closed = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match stalled.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "stalled connection was left open");

    // The active participant is still served.
    active_tx.close().await.unwrap();
    let received = drain.await.unwrap();
    assert!(received > 0);
}

// ============================
// crates/backend-lib/tests/push_gateway.rs
// ============================
//! Push-channel flows over a real socket.

mod common;

use axum::http::{Method, StatusCode};
use axum::Router;
use common::{admin, post, setup_app};
use cosmictv_backend_lib::AppState;
use cosmictv_common::ServerEvent;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serve the app on an ephemeral port
async fn setup_server() -> (SocketAddr, Router, Arc<AppState>) {
    let (app, state) = setup_app();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let served = app.clone();
    tokio::spawn(async move {
        axum::serve(listener, served).await.unwrap();
    });
    (addr, app, state)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    client
}

async fn emit(client: &mut Client, event: Value) {
    client.send(Message::text(event.to_string())).await.unwrap();
}

/// Next server event, skipping control frames
async fn next_event(client: &mut Client) -> ServerEvent {
    loop {
        let frame = timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for an event")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn join(client: &mut Client, channel: &str) {
    emit(client, json!({ "event": "join-channel", "data": { "channelId": channel } })).await;
}

fn count_of(event: &ServerEvent) -> (String, usize) {
    match event {
        ServerEvent::ViewerCountUpdate {
            channel_id, count, ..
        } => (channel_id.clone(), *count),
        other => panic!("expected viewer-count-update, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_broadcasts_to_room() {
    let (addr, _, state) = setup_server().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;

    join(&mut a, "espn-hd").await;
    assert_eq!(
        next_event(&mut a).await,
        ServerEvent::JoinedChannel {
            channel_id: "espn-hd".to_string(),
            viewer_count: 1
        }
    );
    assert_eq!(count_of(&next_event(&mut a).await), ("espn-hd".to_string(), 1));

    join(&mut b, "espn-hd").await;
    assert!(matches!(
        next_event(&mut b).await,
        ServerEvent::JoinedChannel { viewer_count: 2, .. }
    ));
    assert_eq!(count_of(&next_event(&mut b).await), ("espn-hd".to_string(), 2));
    assert_eq!(count_of(&next_event(&mut a).await), ("espn-hd".to_string(), 2));

    assert_eq!(state.presence.get_push_count("espn-hd"), 2);
}

#[tokio::test]
async fn test_room_switch_and_disconnect() {
    let (addr, _, state) = setup_server().await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;

    join(&mut a, "espn-hd").await;
    next_event(&mut a).await;
    next_event(&mut a).await;
    join(&mut b, "espn-hd").await;
    next_event(&mut b).await;
    next_event(&mut b).await;
    next_event(&mut a).await;

    // `b` moves; `a` is told the old room shrank.
    join(&mut b, "fox-sports-hd").await;
    assert_eq!(count_of(&next_event(&mut a).await), ("espn-hd".to_string(), 1));
    assert!(matches!(
        next_event(&mut b).await,
        ServerEvent::JoinedChannel { viewer_count: 1, .. }
    ));

    // `a` hangs up; its room is emptied once the server notices.
    a.close(None).await.unwrap();
    timeout(Duration::from_secs(5), async {
        while state.presence.get_push_count("espn-hd") != 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(state.presence.get_push_count("fox-sports-hd"), 1);
}

#[tokio::test]
async fn test_like_once_over_socket() {
    let (addr, _, _) = setup_server().await;
    let mut a = connect(addr).await;
    join(&mut a, "espn-hd").await;
    next_event(&mut a).await;
    next_event(&mut a).await;

    let like = json!({ "event": "like-channel", "data": { "channelId": "espn-hd" } });
    emit(&mut a, like.clone()).await;
    assert!(matches!(next_event(&mut a).await, ServerEvent::LikeUpdate { likes: 1, .. }));
    assert_eq!(
        next_event(&mut a).await,
        ServerEvent::LikeConfirmed {
            channel_id: "espn-hd".to_string(),
            likes: 1
        }
    );

    emit(&mut a, like).await;
    assert!(matches!(next_event(&mut a).await, ServerEvent::LikeError { .. }));
}

#[tokio::test]
async fn test_malformed_frame_gets_error() {
    let (addr, _, _) = setup_server().await;
    let mut a = connect(addr).await;

    a.send(Message::text("{\"event\":\"dance\"}")).await.unwrap();
    match next_event(&mut a).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, "MALFORMED"),
        other => panic!("unexpected {other:?}"),
    }

    join(&mut a, "no-such-stream").await;
    match next_event(&mut a).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, "NF_001"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_rest_like_reaches_room() {
    let (addr, app, _) = setup_server().await;
    let mut a = connect(addr).await;
    join(&mut a, "fox-sports-hd").await;
    next_event(&mut a).await;
    next_event(&mut a).await;

    let (status, _) = post(&app, "/api/streams/fox-sports-hd/like", json!({ "userId": "u1" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(matches!(next_event(&mut a).await, ServerEvent::LikeUpdate { likes: 1, .. }));
}

#[tokio::test]
async fn test_deleted_stream_zeroes_room() {
    let (addr, app, state) = setup_server().await;
    let mut a = connect(addr).await;
    join(&mut a, "espn-hd").await;
    next_event(&mut a).await;
    next_event(&mut a).await;

    let (status, body) = admin(&app, Method::DELETE, "/api/admin/streams/espn-hd", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["evicted"]["connections"], 1);

    assert_eq!(count_of(&next_event(&mut a).await), ("espn-hd".to_string(), 0));
    assert_eq!(state.presence.get_push_count("espn-hd"), 0);

    // Rejoining a deleted stream fails without closing the socket.
    join(&mut a, "espn-hd").await;
    assert!(matches!(next_event(&mut a).await, ServerEvent::Error { .. }));
}

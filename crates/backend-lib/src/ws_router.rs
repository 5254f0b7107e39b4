// ============================
// cosmictv-backend-lib/src/ws_router.rs
// ============================
//! WebSocket router and connection handling.
use crate::metrics::{WS_ACTIVE, WS_CONNECTION, WS_DISCONNECTION};
use crate::websocket::ConnectionHandler;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header::USER_AGENT, HeaderMap},
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use metrics::{counter, gauge};
use std::sync::Arc;

/// Routes of the push channel
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(ws_handler))
}

/// Handler for WebSocket connections
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    counter!(WS_CONNECTION).increment(1);

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    ws.on_upgrade(move |socket| handle_connection(socket, state, user_agent))
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>, user_agent: Option<String>) {
    let (mut tx, mut rx) = socket.split();
    let (mut handler, mut outbox) = ConnectionHandler::connect(state, user_agent);
    let conn_id = handler.conn_id();
    gauge!(WS_ACTIVE).increment(1.0);

    // Forward queued events to the socket
    let send_task = tokio::spawn(async move {
        while let Some(event) = outbox.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    tracing::error!(%conn_id, error = %err, "failed to serialize event");
                    continue;
                },
            };
            if tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = rx.next().await {
        match message {
            Message::Text(text) => handler.handle_text(text.as_str()),
            Message::Close(_) => break,
            // Pings are answered by axum; binary frames are not part of the protocol.
            _ => {},
        }
    }

    // Transport gone: implicit leave, then drop the outbox
    handler.disconnect();

    counter!(WS_DISCONNECTION).increment(1);
    gauge!(WS_ACTIVE).decrement(1.0);

    send_task.abort();
}

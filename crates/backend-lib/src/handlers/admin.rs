// ============================
// crates/backend-lib/src/handlers/admin.rs
// ============================
//! Admin endpoints. Mounted behind the API key and rate limit middleware.
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use cosmictv_common::{ServerEvent, StreamId};
use serde::Serialize;

use super::{known_stream, parse_body};
use crate::catalog::{NewStream, Stream};
use crate::error::AppError;
use crate::validation::validate_stream_id;
use crate::AppState;

/// `POST /api/admin/streams`
pub async fn create_stream(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Stream>), AppError> {
    let new: NewStream = parse_body(&body)?;
    let stream = state.catalog.insert(new)?;
    Ok((StatusCode::CREATED, Json(stream)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evicted {
    pub connections: usize,
    pub viewers: usize,
    pub messages: usize,
    pub likes: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub message: &'static str,
    pub channel: Stream,
    pub evicted: Evicted,
}

/// `DELETE /api/admin/streams/{id}`.
///
/// Removes the stream and everything attached to it. Members of its room get
/// a last `viewer-count-update` with a count of zero.
pub async fn delete_stream(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<String>,
) -> Result<Json<Deleted>, AppError> {
    validate_stream_id(&stream_id)?;
    // Removed first so new joins for this id fail from here on.
    let channel = state
        .catalog
        .remove(&stream_id)
        .ok_or_else(|| AppError::stream_not_found(&stream_id))?;

    let cleared = state.presence.clear_stream(&stream_id);
    for conn_id in &cleared.connections {
        state
            .hub
            .send_to(*conn_id, ServerEvent::viewer_count(&stream_id, 0));
    }
    let likes = state.likes.remove_stream(&stream_id).unwrap_or_default();
    let messages = state.chat.clear(&stream_id);

    tracing::info!(
        stream_id = %stream_id,
        connections = cleared.connections.len(),
        viewers = cleared.viewers,
        messages,
        "stream deleted"
    );

    Ok(Json(Deleted {
        message: "Stream deleted",
        channel,
        evicted: Evicted {
            connections: cleared.connections.len(),
            viewers: cleared.viewers,
            messages,
            likes,
        },
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatCleared {
    pub stream_id: StreamId,
    pub cleared: usize,
}

/// `DELETE /api/admin/streams/{id}/chat`
pub async fn clear_chat(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<String>,
) -> Result<Json<ChatCleared>, AppError> {
    known_stream(&state, &stream_id)?;
    let cleared = state.chat.clear(&stream_id);
    tracing::info!(stream_id = %stream_id, cleared, "chat cleared");
    Ok(Json(ChatCleared { stream_id, cleared }))
}

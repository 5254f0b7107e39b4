// ============================
// crates/backend-lib/src/handlers/streams.rs
// ============================
//! Public stream endpoints: catalog reads, heartbeat presence, likes, chat.
//!
//! `viewerCount` in these responses is always the heartbeat-path count.
//! Listings additionally carry `pushViewers` and `heartbeatViewers`.
use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use cosmictv_common::{ChatMessage, ServerEvent, StreamId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{known_stream, parse_body};
use crate::catalog::Stream;
use crate::error::AppError;
use crate::validation::{validate_client_id, ValidationError};
use crate::AppState;

// ---- request shapes ----

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerBody {
    pub viewer_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LikeBody {
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatBody {
    pub username: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikesQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

fn query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(q)| q)
        .map_err(|rejection| ValidationError::InvalidQuery(rejection.body_text()).into())
}

fn required_id(field: &'static str, id: Option<&str>) -> Result<String, AppError> {
    Ok(validate_client_id(field, id.unwrap_or_default())?.to_string())
}

// ---- catalog ----

/// A stream with its live counters
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamView {
    #[serde(flatten)]
    pub stream: Stream,
    pub push_viewers: usize,
    pub heartbeat_viewers: usize,
    pub likes: u64,
}

impl StreamView {
    fn live(state: &AppState, mut stream: Stream) -> Self {
        let heartbeat_viewers = state.presence.get_heartbeat_count(&stream.id);
        stream.viewer_count = heartbeat_viewers;
        Self {
            push_viewers: state.presence.get_push_count(&stream.id),
            heartbeat_viewers,
            likes: state.likes.likes(&stream.id),
            stream,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamList {
    pub channels: Vec<StreamView>,
    pub total_channels: usize,
    pub real_time: bool,
}

/// `GET /api/streams?category=`
pub async fn list_streams(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<StreamList>, AppError> {
    let params = query(params)?;
    // The catalog lock is released before the presence maps are read.
    let streams = state.catalog.list(params.category.as_deref());
    let channels: Vec<_> = streams
        .into_iter()
        .map(|stream| StreamView::live(&state, stream))
        .collect();

    Ok(Json(StreamList {
        total_channels: channels.len(),
        channels,
        real_time: true,
    }))
}

/// `GET /api/streams/{id}`
pub async fn get_stream(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<String>,
) -> Result<Json<StreamView>, AppError> {
    let stream = known_stream(&state, &stream_id)?;
    Ok(Json(StreamView::live(&state, stream)))
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LikeTotal {
    pub stream_id: StreamId,
    pub likes: u64,
}

/// `GET /api/streams/likes/summary`
pub async fn likes_summary(State(state): State<Arc<AppState>>) -> Json<BTreeMap<StreamId, LikeTotal>> {
    let summary = state
        .likes
        .summary()
        .into_iter()
        .map(|(stream_id, likes)| {
            let total = LikeTotal {
                stream_id: stream_id.clone(),
                likes,
            };
            (stream_id, total)
        })
        .collect();
    Json(summary)
}

// ---- heartbeat presence ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Joined {
    pub viewer_id: String,
    pub viewer_count: usize,
    pub stream_id: StreamId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerCount {
    pub viewer_count: usize,
    pub stream_id: StreamId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewers {
    pub stream_id: StreamId,
    pub viewer_count: usize,
    pub push_viewers: usize,
    pub timestamp: DateTime<Utc>,
}

/// `POST /api/streams/{id}/join`; generates a viewer id when none is sent
pub async fn join(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<String>,
    body: Bytes,
) -> Result<Json<Joined>, AppError> {
    known_stream(&state, &stream_id)?;
    let body: ViewerBody = parse_body(&body)?;

    let viewer_id = match body.viewer_id.as_deref() {
        Some(id) => validate_client_id("viewerId", id)?.to_string(),
        None => Uuid::new_v4().to_string(),
    };
    let viewer_count = state.presence.join_heartbeat(&stream_id, &viewer_id)?;
    tracing::info!(stream_id = %stream_id, viewer_id = %viewer_id, viewer_count, "heartbeat viewer joined");

    Ok(Json(Joined {
        viewer_id,
        viewer_count,
        stream_id,
    }))
}

/// `POST /api/streams/{id}/leave`; leaving twice is not an error
pub async fn leave(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<String>,
    body: Bytes,
) -> Result<Json<ViewerCount>, AppError> {
    known_stream(&state, &stream_id)?;
    let body: ViewerBody = parse_body(&body)?;
    let viewer_id = required_id("viewerId", body.viewer_id.as_deref())?;

    if state.presence.leave_heartbeat(&viewer_id).is_some() {
        tracing::info!(stream_id = %stream_id, viewer_id = %viewer_id, "heartbeat viewer left");
    }

    Ok(Json(ViewerCount {
        viewer_count: state.presence.get_heartbeat_count(&stream_id),
        stream_id,
    }))
}

/// `POST /api/streams/{id}/ping`; 404 once the session is gone
pub async fn ping(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<String>,
    body: Bytes,
) -> Result<Json<ViewerCount>, AppError> {
    known_stream(&state, &stream_id)?;
    let body: ViewerBody = parse_body(&body)?;
    let viewer_id = required_id("viewerId", body.viewer_id.as_deref())?;

    let (session_stream, viewer_count) = state.presence.ping(&viewer_id)?;
    Ok(Json(ViewerCount {
        viewer_count,
        stream_id: session_stream,
    }))
}

/// `GET /api/streams/{id}/viewers`
pub async fn viewers(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<String>,
) -> Result<Json<Viewers>, AppError> {
    known_stream(&state, &stream_id)?;
    Ok(Json(Viewers {
        viewer_count: state.presence.get_heartbeat_count(&stream_id),
        push_viewers: state.presence.get_push_count(&stream_id),
        stream_id,
        timestamp: Utc::now(),
    }))
}

// ---- likes ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Likes {
    pub stream_id: StreamId,
    pub likes: u64,
    pub liked: bool,
    pub timestamp: DateTime<Utc>,
}

/// `POST /api/streams/{id}/like`; toggles and tells the stream's room
pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<String>,
    body: Bytes,
) -> Result<Json<Likes>, AppError> {
    known_stream(&state, &stream_id)?;
    let body: LikeBody = parse_body(&body)?;
    let user_id = required_id("userId", body.user_id.as_deref())?;

    let outcome = state.likes.toggle_then(&stream_id, &user_id, |outcome| {
        state.presence.with_room(&stream_id, |room| {
            state
                .hub
                .broadcast(room, &ServerEvent::like_update(&stream_id, outcome.likes))
        });
    });

    Ok(Json(Likes {
        stream_id,
        likes: outcome.likes,
        liked: outcome.liked,
        timestamp: Utc::now(),
    }))
}

/// `GET /api/streams/{id}/likes?userId=`
pub async fn get_likes(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<String>,
    params: Result<Query<LikesQuery>, QueryRejection>,
) -> Result<Json<Likes>, AppError> {
    known_stream(&state, &stream_id)?;
    let params = query(params)?;

    let like_state = state.likes.state(&stream_id, params.user_id.as_deref());
    Ok(Json(Likes {
        stream_id,
        likes: like_state.likes,
        liked: like_state.liked,
        timestamp: Utc::now(),
    }))
}

// ---- chat ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Posted {
    pub stream_id: StreamId,
    pub message: ChatMessage,
    pub total_messages: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistory {
    pub stream_id: StreamId,
    pub messages: Vec<ChatMessage>,
    pub total_messages: usize,
    pub offset: usize,
    pub limit: usize,
    pub timestamp: DateTime<Utc>,
}

/// `POST /api/streams/{id}/chat`
pub async fn post_chat(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<String>,
    body: Bytes,
) -> Result<Json<Posted>, AppError> {
    known_stream(&state, &stream_id)?;
    let body: ChatBody = parse_body(&body)?;

    let (message, total_messages) = state.chat.post(
        &stream_id,
        body.username.as_deref().unwrap_or_default(),
        body.message.as_deref().unwrap_or_default(),
    )?;

    Ok(Json(Posted {
        stream_id,
        message,
        total_messages,
        timestamp: Utc::now(),
    }))
}

/// `GET /api/streams/{id}/chat?limit=&offset=`
pub async fn get_chat(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<String>,
    params: Result<Query<ChatQuery>, QueryRejection>,
) -> Result<Json<ChatHistory>, AppError> {
    known_stream(&state, &stream_id)?;
    let params = query(params)?;
    let limit = params
        .limit
        .unwrap_or(state.chat.settings().default_page_size);
    let offset = params.offset.unwrap_or(0);

    let page = state.chat.page(&stream_id, limit, offset);
    Ok(Json(ChatHistory {
        stream_id,
        messages: page.messages,
        total_messages: page.total,
        offset,
        limit,
        timestamp: Utc::now(),
    }))
}

// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers.
use axum::{body::Bytes, extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use crate::catalog::Stream;
use crate::error::AppError;
use crate::validation::validate_stream_id;
use crate::AppState;

pub mod admin;
pub mod streams;

/// Parse an optional JSON body. An empty body yields `T::default()`.
pub(crate) fn parse_body<T>(body: &Bytes) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}

/// Validate a path id and look the stream up
pub(crate) fn known_stream(state: &AppState, stream_id: &str) -> Result<Stream, AppError> {
    validate_stream_id(stream_id)?;
    state.catalog.require(stream_id)
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
    pub channels: usize,
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "OK",
        message: "CosmicTV backend",
        timestamp: Utc::now(),
        channels: state.catalog.len(),
    })
}

//! Static API key guard for admin routes.
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, AppState};

const API_KEY_HEADER: &str = "x-api-key";

/// Key presented by the caller: `X-API-Key`, else `Authorization: Bearer`
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
        })
        .map(str::trim)
}

/// Constant-time comparison
fn keys_match(expected: &str, presented: &str) -> bool {
    let (a, b) = (expected.as_bytes(), presented.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Reject admin requests without the configured key.
///
/// With no key configured the admin surface is unavailable (503).
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.settings.admin_key() else {
        return Err(AppError::AdminUnavailable);
    };

    match presented_key(request.headers()) {
        Some(key) if keys_match(expected, key) => {},
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "admin request with wrong key");
            return Err(AppError::Unauthorized("invalid API key".to_string()));
        },
        None => return Err(AppError::Unauthorized("missing API key".to_string())),
    }

    Ok(next.run(request).await)
}

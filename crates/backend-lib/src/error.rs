// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cosmictv_common::ServerEvent;
use thiserror::Error;

use crate::validation::ValidationError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Heartbeat session not found for viewer {0}")]
    SessionNotFound(String),

    #[error("Voter already liked stream {0}")]
    AlreadyVoted(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Admin authentication is not configured")]
    AdminUnavailable,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for an unknown stream id
    pub fn stream_not_found(stream_id: &str) -> Self {
        AppError::NotFound(format!("stream {stream_id}"))
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyVoted(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AdminUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::InvalidJson(_) => "JSON_001",
            AppError::NotFound(_) => "NF_001",
            AppError::SessionNotFound(_) => "SESSION_001",
            AppError::AlreadyVoted(_) => "LIKE_001",
            AppError::Unauthorized(_) => "AUTH_001",
            AppError::AdminUnavailable => "AUTH_002",
            AppError::RateLimitExceeded => "RATE_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            // Field-level detail is what the client needs to fix its input.
            AppError::Validation(err) => err.to_string(),
            AppError::InvalidJson(_) => "Invalid request format".to_string(),
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::SessionNotFound(_) => "Session not found, join the stream again".to_string(),
            AppError::AlreadyVoted(_) => "You already liked this channel".to_string(),
            AppError::Unauthorized(_) => "Authentication required".to_string(),
            AppError::AdminUnavailable => "Admin authentication is not configured".to_string(),
            AppError::RateLimitExceeded => {
                "Rate limit exceeded, please try again later".to_string()
            },
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    /// Convert into the push-channel error event sent to the caller
    pub fn to_server_event(&self) -> ServerEvent {
        ServerEvent::Error {
            code: self.error_code().to_string(),
            message: self.sanitized_message(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code = error_code, "request failed");
        }

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

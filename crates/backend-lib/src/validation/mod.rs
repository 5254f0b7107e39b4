// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Input validation for REST bodies and push-channel events.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::config::ChatSettings;

const MAX_STREAM_ID_LENGTH: usize = 64;
const MAX_VOTER_ID_LENGTH: usize = 128;

static STREAM_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("stream id pattern compiles"));

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    EmptyField(&'static str),

    #[error("Invalid stream id: {0}")]
    InvalidStreamId(String),

    #[error("{field} is too long (max {max} characters)")]
    TooLong { field: &'static str, max: usize },

    #[error("Message too short (min {min} characters)")]
    MessageTooShort { min: usize },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a stream id taken from a path or an event
pub fn validate_stream_id(stream_id: &str) -> ValidationResult<&str> {
    if stream_id.is_empty() {
        return Err(ValidationError::EmptyField("channelId"));
    }

    if stream_id.len() > MAX_STREAM_ID_LENGTH || !STREAM_ID_REGEX.is_match(stream_id) {
        return Err(ValidationError::InvalidStreamId(stream_id.to_string()));
    }

    Ok(stream_id)
}

/// Validate an opaque client identifier (viewer id, like voter id)
pub fn validate_client_id<'a>(field: &'static str, id: &'a str) -> ValidationResult<&'a str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    if id.chars().count() > MAX_VOTER_ID_LENGTH {
        return Err(ValidationError::TooLong { field, max: MAX_VOTER_ID_LENGTH });
    }
    Ok(id)
}

/// A chat post that passed validation, with author and text trimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidChat {
    pub username: String,
    pub message: String,
}

/// Validate a chat post.
///
/// The raw text length is bounded by `max_len`; the trimmed text must hold at
/// least `min_len` characters. Lengths are counted in chars, not bytes.
pub fn validate_chat(username: &str, message: &str, limits: &ChatSettings) -> ValidationResult<ValidChat> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ValidationError::EmptyField("username"));
    }

    if message.trim().is_empty() {
        return Err(ValidationError::EmptyField("message"));
    }
    if message.chars().count() > limits.max_len {
        return Err(ValidationError::TooLong { field: "message", max: limits.max_len });
    }

    let trimmed = message.trim();
    if trimmed.chars().count() < limits.min_len {
        return Err(ValidationError::MessageTooShort { min: limits.min_len });
    }

    Ok(ValidChat {
        username: username.to_string(),
        message: trimmed.to_string(),
    })
}

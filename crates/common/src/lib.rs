// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between the `CosmicTV` clients and server.
//! This module defines the push-channel protocol events and supporting types.
//!
//! Every frame on the push channel is a JSON text message of the form
//! `{"event": "<name>", "data": <payload>}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stream (channel) identifier
pub type StreamId = String;

/// Events sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Enter the room of a stream. Leaves the previous room, if any.
    /// # Fields
    /// * `channel_id` - Stream to join
    /// * `user_agent` - Free-form client description
    /// * `country` - Coarse country code reported by the client
    #[serde(rename_all = "camelCase")]
    JoinChannel {
        channel_id: StreamId,
        #[serde(default)]
        user_agent: Option<String>,
        #[serde(default)]
        country: Option<String>,
    },
    /// Leave the room of a stream
    LeaveChannel(StreamId),
    /// Like a stream once
    /// # Fields
    /// * `channel_id` - Stream to like
    /// * `user_id` - Voter identity; the connection id is used when absent
    #[serde(rename_all = "camelCase")]
    LikeChannel {
        channel_id: StreamId,
        #[serde(default)]
        user_id: Option<String>,
    },
}

/// Events sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Confirmation to the joining connection only
    #[serde(rename_all = "camelCase")]
    JoinedChannel {
        channel_id: StreamId,
        viewer_count: usize,
    },
    /// Push-path viewer count, broadcast to the room
    #[serde(rename_all = "camelCase")]
    ViewerCountUpdate {
        channel_id: StreamId,
        count: usize,
        timestamp: DateTime<Utc>,
    },
    /// Like total, broadcast to the room
    #[serde(rename_all = "camelCase")]
    LikeUpdate {
        channel_id: StreamId,
        likes: u64,
        timestamp: DateTime<Utc>,
    },
    /// Like accepted, sent to the voter only
    #[serde(rename_all = "camelCase")]
    LikeConfirmed { channel_id: StreamId, likes: u64 },
    /// Like rejected, sent to the voter only
    LikeError { message: String },
    /// Any other failure handling a client event
    Error { code: String, message: String },
}

impl ServerEvent {
    /// Build a `viewer-count-update` stamped with the current time
    pub fn viewer_count(channel_id: &str, count: usize) -> Self {
        ServerEvent::ViewerCountUpdate {
            channel_id: channel_id.to_string(),
            count,
            timestamp: Utc::now(),
        }
    }

    /// Build a `like-update` stamped with the current time
    pub fn like_update(channel_id: &str, likes: u64) -> Self {
        ServerEvent::LikeUpdate {
            channel_id: channel_id.to_string(),
            likes,
            timestamp: Utc::now(),
        }
    }
}

/// A chat message stored in a stream's ring buffer
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// `<millis>-<random suffix>`
    pub id: String,
    pub username: String,
    pub message: String,
    /// Server time in milliseconds since the epoch
    pub timestamp: i64,
    pub color_hex: String,
}

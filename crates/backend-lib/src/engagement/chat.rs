// ============================
// crates/backend-lib/src/engagement/chat.rs
// ============================
//! Per-stream chat ring buffers.

use std::collections::VecDeque;

use chrono::Utc;
use cosmictv_common::{ChatMessage, StreamId};
use dashmap::DashMap;
use metrics::counter;
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::config::ChatSettings;
use crate::metrics::CHAT_POSTED;
use crate::validation::{validate_chat, ValidationResult};

const ID_SUFFIX_LEN: usize = 9;
const DEFAULT_COLOR: &str = "#00BFFF";

/// One page of a stream's chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPage {
    pub messages: Vec<ChatMessage>,
    pub total: usize,
}

/// Bounded, FIFO-evicting chat history per stream
pub struct ChatStore {
    buffers: DashMap<StreamId, VecDeque<ChatMessage>>,
    settings: ChatSettings,
}

impl ChatStore {
    pub fn new(settings: ChatSettings) -> Self {
        Self {
            buffers: DashMap::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    /// Validate and append a message.
    ///
    /// Returns the stored record and the stream's message count afterwards.
    pub fn post(
        &self,
        stream_id: &str,
        username: &str,
        message: &str,
    ) -> ValidationResult<(ChatMessage, usize)> {
        let valid = validate_chat(username, message, &self.settings)?;

        let now = Utc::now().timestamp_millis();
        let record = ChatMessage {
            id: format!("{now}-{}", random_suffix()),
            username: valid.username,
            message: valid.message,
            timestamp: now,
            color_hex: DEFAULT_COLOR.to_string(),
        };

        let mut buffer = self.buffers.entry(stream_id.to_string()).or_default();
        buffer.push_back(record.clone());
        while buffer.len() > self.settings.capacity {
            buffer.pop_front();
        }
        let total = buffer.len();
        drop(buffer);

        counter!(CHAT_POSTED).increment(1);
        tracing::debug!(stream_id, username = %record.username, total, "chat message posted");
        Ok((record, total))
    }

    /// Messages `offset..offset + limit` in posting order
    pub fn page(&self, stream_id: &str, limit: usize, offset: usize) -> ChatPage {
        self.buffers.get(stream_id).map_or_else(
            || ChatPage {
                messages: Vec::new(),
                total: 0,
            },
            |buffer| ChatPage {
                messages: buffer.iter().skip(offset).take(limit).cloned().collect(),
                total: buffer.len(),
            },
        )
    }

    pub fn len(&self, stream_id: &str) -> usize {
        self.buffers.get(stream_id).map_or(0, |buffer| buffer.len())
    }

    /// Empty a stream's history, returning how many messages were dropped
    pub fn clear(&self, stream_id: &str) -> usize {
        self.buffers
            .remove(stream_id)
            .map_or(0, |(_, buffer)| buffer.len())
    }
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

// ============================
// crates/backend-lib/src/engagement/likes.rs
// ============================
//! Per-stream like counters with one vote per voter id.

use std::collections::{BTreeMap, HashSet};

use cosmictv_common::StreamId;
use dashmap::DashMap;
use metrics::counter;

use crate::error::AppError;
use crate::metrics::LIKE_TOGGLED;

#[derive(Debug, Default)]
struct LikeRecord {
    likes: u64,
    voters: HashSet<String>,
}

/// Result of a toggle or a read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeState {
    pub likes: u64,
    pub liked: bool,
}

/// Like records for every stream
#[derive(Default)]
pub struct LikeStore {
    records: DashMap<StreamId, LikeRecord>,
}

impl LikeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip a voter's like on a stream
    pub fn toggle(&self, stream_id: &str, voter_id: &str) -> LikeState {
        self.toggle_then(stream_id, voter_id, |_| {})
    }

    /// Flip a voter's like and run `then` with the new state before the
    /// record is released, so concurrent toggles publish in order.
    pub fn toggle_then<F>(&self, stream_id: &str, voter_id: &str, then: F) -> LikeState
    where
        F: FnOnce(LikeState),
    {
        let mut record = self.records.entry(stream_id.to_string()).or_default();
        let liked = if record.voters.remove(voter_id) {
            record.likes = record.likes.saturating_sub(1);
            false
        } else {
            record.voters.insert(voter_id.to_string());
            record.likes += 1;
            true
        };

        let state = LikeState {
            likes: record.likes,
            liked,
        };
        counter!(LIKE_TOGGLED).increment(1);
        tracing::debug!(stream_id, voter_id, likes = state.likes, liked, "like toggled");
        then(state);
        state
    }

    /// Add a like once; a repeat vote fails with `AlreadyVoted`.
    ///
    /// `then` runs with the new total while the record is held.
    pub fn vote_then<F>(&self, stream_id: &str, voter_id: &str, then: F) -> Result<u64, AppError>
    where
        F: FnOnce(u64),
    {
        let mut record = self.records.entry(stream_id.to_string()).or_default();
        if !record.voters.insert(voter_id.to_string()) {
            return Err(AppError::AlreadyVoted(stream_id.to_string()));
        }
        record.likes += 1;

        let likes = record.likes;
        counter!(LIKE_TOGGLED).increment(1);
        then(likes);
        Ok(likes)
    }

    /// Like count and, when a voter is given, whether they have liked
    pub fn state(&self, stream_id: &str, voter_id: Option<&str>) -> LikeState {
        self.records.get(stream_id).map_or(
            LikeState {
                likes: 0,
                liked: false,
            },
            |record| LikeState {
                likes: record.likes,
                liked: voter_id.is_some_and(|voter| record.voters.contains(voter)),
            },
        )
    }

    pub fn likes(&self, stream_id: &str) -> u64 {
        self.state(stream_id, None).likes
    }

    /// Like totals of every stream that has a record
    pub fn summary(&self) -> BTreeMap<StreamId, u64> {
        self.records
            .iter()
            .map(|entry| (entry.key().clone(), entry.likes))
            .collect()
    }

    /// Forget a voter id without touching the count
    pub fn release_voter(&self, stream_id: &str, voter_id: &str) {
        if let Some(mut record) = self.records.get_mut(stream_id) {
            record.voters.remove(voter_id);
        }
    }

    pub fn remove_stream(&self, stream_id: &str) -> Option<u64> {
        self.records.remove(stream_id).map(|(_, record)| record.likes)
    }
}

// ============================
// crates/backend-lib/src/presence/store.rs
// ============================
//! Viewer bookkeeping for both tracking paths.
//!
//! Push sessions are keyed by connection id and grouped into rooms; heartbeat
//! sessions are keyed by a client-generated viewer id and grouped into active
//! viewer sets. The two counts are kept apart and reported separately as
//! `pushViewers` and `heartbeatViewers`.
//!
//! # Locking
//! Every mutation of a stream's set happens while holding that stream's
//! `DashMap` entry, and the resulting count is published (broadcast callback
//! or [`ViewerCountSink`]) before the entry is released. Lock order is always
//! set entry, then session map, then sink. No guard on a session map is held
//! while a set entry is acquired.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cosmictv_common::StreamId;
use dashmap::DashMap;
use metrics::{counter, gauge};
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::AppError;
use crate::metrics::{HEARTBEAT_ACTIVE, HEARTBEAT_JOINED, PUSH_JOINED};

/// Identifier of one push-channel connection
pub type ConnectionId = Uuid;
/// Client-generated identifier of a heartbeat viewer
pub type ViewerId = String;

/// Receives the heartbeat-path count whenever it changes
pub trait ViewerCountSink: Send + Sync {
    fn viewer_count_changed(&self, stream_id: &str, count: usize) -> Result<(), AppError>;
}

/// Client description reported on join
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta {
    pub user_agent: Option<String>,
    pub country: Option<String>,
}

/// A push connection's membership record
#[derive(Debug, Clone)]
pub struct PushSession {
    pub stream_id: StreamId,
    pub connected_at: DateTime<Utc>,
    pub meta: ClientMeta,
}

/// A heartbeat viewer's membership record
#[derive(Debug, Clone)]
pub struct HeartbeatSession {
    pub stream_id: StreamId,
    pub last_ping: Instant,
}

/// A room as seen from inside its lock
#[derive(Debug, Clone, Copy)]
pub struct RoomView<'a> {
    pub stream_id: &'a str,
    pub members: &'a HashSet<ConnectionId>,
}

impl RoomView<'_> {
    pub fn count(&self) -> usize {
        self.members.len()
    }
}

/// What a stream deletion evicted
#[derive(Debug, Default)]
pub struct ClearedStream {
    pub connections: Vec<ConnectionId>,
    pub viewers: usize,
}

/// Process-wide presence state
pub struct PresenceStore {
    rooms: DashMap<StreamId, HashSet<ConnectionId>>,
    push_sessions: DashMap<ConnectionId, PushSession>,
    viewers: DashMap<StreamId, HashSet<ViewerId>>,
    heartbeats: DashMap<ViewerId, HeartbeatSession>,
    sink: Arc<dyn ViewerCountSink>,
}

impl PresenceStore {
    pub fn new(sink: Arc<dyn ViewerCountSink>) -> Self {
        Self {
            rooms: DashMap::new(),
            push_sessions: DashMap::new(),
            viewers: DashMap::new(),
            heartbeats: DashMap::new(),
            sink,
        }
    }

    // ---- push path ----

    /// Put a connection in a stream's room.
    ///
    /// A connection sitting in another room leaves it first, and `notify` is
    /// called for that room too. `notify` runs while the room is locked, so
    /// broadcasts for one room are ordered like the mutations that caused them.
    /// Joining the same room twice is a no-op apart from the notification.
    pub fn join_push<F>(
        &self,
        stream_id: &str,
        conn_id: ConnectionId,
        meta: ClientMeta,
        notify: F,
    ) -> usize
    where
        F: FnMut(RoomView<'_>),
    {
        self.join_push_if(stream_id, conn_id, meta, || true, notify)
            .unwrap_or_default()
    }

    /// Like [`join_push`](Self::join_push), but `admit` is asked again once
    /// the room is locked.
    ///
    /// A refused join leaves the room untouched and returns `None`. The
    /// connection has still left its previous room by then.
    pub fn join_push_if<A, F>(
        &self,
        stream_id: &str,
        conn_id: ConnectionId,
        meta: ClientMeta,
        admit: A,
        mut notify: F,
    ) -> Option<usize>
    where
        A: FnOnce() -> bool,
        F: FnMut(RoomView<'_>),
    {
        if let Some(previous) = self.current_room(conn_id) {
            if previous != stream_id {
                self.leave_push(conn_id, &mut notify);
            }
        }

        let count = {
            let mut room = self.rooms.entry(stream_id.to_string()).or_default();
            if admit() {
                if room.insert(conn_id) {
                    self.push_sessions.insert(
                        conn_id,
                        PushSession {
                            stream_id: stream_id.to_string(),
                            connected_at: Utc::now(),
                            meta,
                        },
                    );
                    counter!(PUSH_JOINED).increment(1);
                }

                let count = room.len();
                tracing::debug!(stream_id, %conn_id, count, "push join");
                notify(RoomView {
                    stream_id,
                    members: &room,
                });
                Some(count)
            } else {
                None
            }
        };

        if count.is_none() {
            self.rooms.remove_if(stream_id, |_, members| members.is_empty());
            tracing::debug!(stream_id, %conn_id, "push join refused");
        }
        count
    }

    /// Take a connection out of whatever room it is in.
    ///
    /// Returns the room and its new size, or `None` if the connection was in
    /// no room.
    pub fn leave_push<F>(&self, conn_id: ConnectionId, mut notify: F) -> Option<(StreamId, usize)>
    where
        F: FnMut(RoomView<'_>),
    {
        let stream_id = self.current_room(conn_id)?;

        let count = {
            let mut room = self.rooms.get_mut(&stream_id)?;
            // The session may have moved since the lookup above.
            self.push_sessions
                .remove_if(&conn_id, |_, session| session.stream_id == stream_id)?;
            room.remove(&conn_id);

            let count = room.len();
            tracing::debug!(stream_id = %stream_id, %conn_id, count, "push leave");
            notify(RoomView {
                stream_id: &stream_id,
                members: &room,
            });
            count
        };

        self.rooms.remove_if(&stream_id, |_, members| members.is_empty());
        Some((stream_id, count))
    }

    /// The room a connection is currently in
    pub fn current_room(&self, conn_id: ConnectionId) -> Option<StreamId> {
        self.push_sessions
            .get(&conn_id)
            .map(|session| session.stream_id.clone())
    }

    pub fn push_session(&self, conn_id: ConnectionId) -> Option<PushSession> {
        self.push_sessions.get(&conn_id).map(|s| s.value().clone())
    }

    pub fn get_push_count(&self, stream_id: &str) -> usize {
        self.rooms.get(stream_id).map_or(0, |room| room.len())
    }

    /// Run `f` against a room while holding it, so nothing joins or leaves
    /// until `f` returns. `None` if the room is empty.
    pub fn with_room<R>(&self, stream_id: &str, f: impl FnOnce(RoomView<'_>) -> R) -> Option<R> {
        let room = self.rooms.get(stream_id)?;
        Some(f(RoomView {
            stream_id,
            members: &room,
        }))
    }

    // ---- heartbeat path ----

    /// Start (or restart) a heartbeat session.
    ///
    /// A viewer re-joining the same stream only has its ping refreshed. A
    /// viewer moving from another stream is removed from that stream once the
    /// new stream is released. If the sink rejects the new count, the
    /// insertion is rolled back.
    pub fn join_heartbeat(&self, stream_id: &str, viewer_id: &str) -> Result<usize, AppError> {
        let (count, result, previous) = {
            let mut set = self.viewers.entry(stream_id.to_string()).or_default();
            let inserted = set.insert(viewer_id.to_string());
            // Where the viewer was; a racing join may already have moved it.
            let previous = self
                .heartbeats
                .insert(
                    viewer_id.to_string(),
                    HeartbeatSession {
                        stream_id: stream_id.to_string(),
                        last_ping: Instant::now(),
                    },
                )
                .map(|session| session.stream_id)
                .filter(|previous| previous != stream_id);

            let result = self.sink.viewer_count_changed(stream_id, set.len());
            if result.is_err() && inserted {
                set.remove(viewer_id);
                self.heartbeats
                    .remove_if(viewer_id, |_, session| session.stream_id == stream_id);
            } else if inserted {
                counter!(HEARTBEAT_JOINED).increment(1);
            }
            (set.len(), result, previous)
        };

        if let Some(previous) = previous {
            self.detach_heartbeat(&previous, viewer_id);
        }

        if let Err(err) = result {
            self.viewers.remove_if(stream_id, |_, set| set.is_empty());
            return Err(err);
        }

        gauge!(HEARTBEAT_ACTIVE).set(self.heartbeats.len() as f64);
        tracing::debug!(stream_id, viewer_id, count, "heartbeat join");
        Ok(count)
    }

    /// Refresh a session's last ping.
    ///
    /// Returns the session's stream and its heartbeat count.
    pub fn ping(&self, viewer_id: &str) -> Result<(StreamId, usize), AppError> {
        let stream_id = {
            let mut session = self
                .heartbeats
                .get_mut(viewer_id)
                .ok_or_else(|| AppError::SessionNotFound(viewer_id.to_string()))?;
            session.last_ping = Instant::now();
            session.stream_id.clone()
        };
        let count = self.get_heartbeat_count(&stream_id);
        Ok((stream_id, count))
    }

    /// End a heartbeat session. Unknown viewers are ignored.
    pub fn leave_heartbeat(&self, viewer_id: &str) -> Option<(StreamId, usize)> {
        let stream_id = self
            .heartbeats
            .get(viewer_id)
            .map(|session| session.stream_id.clone())?;

        let count = {
            let mut set = self.viewers.get_mut(&stream_id)?;
            self.heartbeats
                .remove_if(viewer_id, |_, session| session.stream_id == stream_id)?;
            set.remove(viewer_id);

            let count = set.len();
            if let Err(err) = self.sink.viewer_count_changed(&stream_id, count) {
                tracing::warn!(stream_id = %stream_id, error = %err, "viewer count not published");
            }
            count
        };

        self.viewers.remove_if(&stream_id, |_, set| set.is_empty());
        gauge!(HEARTBEAT_ACTIVE).set(self.heartbeats.len() as f64);
        tracing::debug!(stream_id = %stream_id, viewer_id, count, "heartbeat leave");
        Some((stream_id, count))
    }

    /// Drop a viewer from a stream it has moved away from.
    ///
    /// The viewer stays if its session points back at `stream_id` by the time
    /// the set is locked.
    fn detach_heartbeat(&self, stream_id: &str, viewer_id: &str) {
        let count = {
            let Some(mut set) = self.viewers.get_mut(stream_id) else {
                return;
            };
            let returned = self
                .heartbeats
                .get(viewer_id)
                .is_some_and(|session| session.stream_id == stream_id);
            if returned || !set.remove(viewer_id) {
                return;
            }

            let count = set.len();
            if let Err(err) = self.sink.viewer_count_changed(stream_id, count) {
                tracing::warn!(stream_id, error = %err, "viewer count not published");
            }
            count
        };

        self.viewers.remove_if(stream_id, |_, set| set.is_empty());
        tracing::debug!(stream_id, viewer_id, count, "heartbeat viewer moved away");
    }

    pub fn get_heartbeat_count(&self, stream_id: &str) -> usize {
        self.viewers.get(stream_id).map_or(0, |set| set.len())
    }

    pub fn heartbeat_session(&self, viewer_id: &str) -> Option<HeartbeatSession> {
        self.heartbeats.get(viewer_id).map(|s| s.value().clone())
    }

    /// Total heartbeat sessions across all streams
    pub fn heartbeat_sessions(&self) -> usize {
        self.heartbeats.len()
    }

    /// Sessions whose last ping is older than `timeout` at `now`
    pub fn stale_heartbeats(&self, now: Instant, timeout: Duration) -> Vec<(ViewerId, StreamId)> {
        self.heartbeats
            .iter()
            .filter(|entry| now.saturating_duration_since(entry.last_ping) > timeout)
            .map(|entry| (entry.key().clone(), entry.stream_id.clone()))
            .collect()
    }

    /// Evict one session if it is still stale once its stream is locked.
    ///
    /// `Ok(None)` means the session was refreshed, moved or already gone.
    /// An `Err` means the session was evicted but the new count could not be
    /// published.
    pub fn expire_heartbeat(
        &self,
        viewer_id: &str,
        stream_id: &str,
        now: Instant,
        timeout: Duration,
    ) -> Result<Option<usize>, AppError> {
        let is_stale = |session: &HeartbeatSession| {
            session.stream_id == stream_id
                && now.saturating_duration_since(session.last_ping) > timeout
        };

        let Some(mut set) = self.viewers.get_mut(stream_id) else {
            // Orphaned session with no set behind it.
            self.heartbeats.remove_if(viewer_id, |_, session| is_stale(session));
            return Ok(None);
        };

        if self
            .heartbeats
            .remove_if(viewer_id, |_, session| is_stale(session))
            .is_none()
        {
            return Ok(None);
        }
        set.remove(viewer_id);

        let count = set.len();
        let published = self.sink.viewer_count_changed(stream_id, count);
        drop(set);

        self.viewers.remove_if(stream_id, |_, set| set.is_empty());
        published.map(|()| Some(count))
    }

    // ---- lifecycle ----

    /// Drop every push and heartbeat session of a stream
    pub fn clear_stream(&self, stream_id: &str) -> ClearedStream {
        let connections: Vec<ConnectionId> = self
            .rooms
            .remove(stream_id)
            .map(|(_, members)| members.into_iter().collect())
            .unwrap_or_default();
        for conn_id in &connections {
            self.push_sessions
                .remove_if(conn_id, |_, session| session.stream_id == stream_id);
        }

        let viewers = self
            .viewers
            .remove(stream_id)
            .map(|(_, set)| {
                for viewer_id in &set {
                    self.heartbeats
                        .remove_if(viewer_id, |_, session| session.stream_id == stream_id);
                }
                set.len()
            })
            .unwrap_or_default();

        gauge!(HEARTBEAT_ACTIVE).set(self.heartbeats.len() as f64);
        tracing::info!(stream_id, connections = connections.len(), viewers, "stream presence cleared");
        ClearedStream {
            connections,
            viewers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Records the last count per stream; rejects streams listed in `missing`.
    #[derive(Default)]
    struct RecordingSink {
        counts: Mutex<HashMap<String, usize>>,
        missing: Mutex<HashSet<String>>,
    }

    impl RecordingSink {
        fn last(&self, stream_id: &str) -> Option<usize> {
            self.counts.lock().get(stream_id).copied()
        }
    }

    impl ViewerCountSink for RecordingSink {
        fn viewer_count_changed(&self, stream_id: &str, count: usize) -> Result<(), AppError> {
            if self.missing.lock().contains(stream_id) {
                return Err(AppError::stream_not_found(stream_id));
            }
            self.counts.lock().insert(stream_id.to_string(), count);
            Ok(())
        }
    }

    fn store() -> (PresenceStore, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        (PresenceStore::new(sink.clone()), sink)
    }

    fn ignore(_: RoomView<'_>) {}

    #[tokio::test]
    async fn test_heartbeat_join_is_idempotent() {
        let (store, sink) = store();
        assert_eq!(store.join_heartbeat("s1", "v1").unwrap(), 1);
        assert_eq!(store.join_heartbeat("s1", "v1").unwrap(), 1);
        assert_eq!(store.get_heartbeat_count("s1"), 1);
        assert_eq!(sink.last("s1"), Some(1));
    }

    #[tokio::test]
    async fn test_leave_unknown_viewer_is_a_no_op() {
        let (store, sink) = store();
        store.join_heartbeat("s1", "v1").unwrap();

        assert!(store.leave_heartbeat("nobody").is_none());
        assert_eq!(store.get_heartbeat_count("s1"), 1);
        assert_eq!(sink.last("s1"), Some(1));
    }

    #[tokio::test]
    async fn test_heartbeat_leave_updates_sink() {
        let (store, sink) = store();
        store.join_heartbeat("s1", "v1").unwrap();
        store.join_heartbeat("s1", "v2").unwrap();

        assert_eq!(store.leave_heartbeat("v1"), Some(("s1".to_string(), 1)));
        assert_eq!(sink.last("s1"), Some(1));
        assert!(store.heartbeat_session("v1").is_none());
        // A second leave changes nothing.
        assert!(store.leave_heartbeat("v1").is_none());
    }

    #[tokio::test]
    async fn test_heartbeat_viewer_moves_between_streams() {
        let (store, sink) = store();
        store.join_heartbeat("s1", "v1").unwrap();
        store.join_heartbeat("s2", "v1").unwrap();

        assert_eq!(store.get_heartbeat_count("s1"), 0);
        assert_eq!(store.get_heartbeat_count("s2"), 1);
        assert_eq!(sink.last("s1"), Some(0));
        assert_eq!(store.heartbeat_sessions(), 1);
    }

    #[tokio::test]
    async fn test_join_rolls_back_when_sink_rejects() {
        let (store, sink) = store();
        sink.missing.lock().insert("gone".to_string());

        let err = store.join_heartbeat("gone", "v1").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(store.get_heartbeat_count("gone"), 0);
        assert!(store.heartbeat_session("v1").is_none());
    }

    #[tokio::test]
    async fn test_ping_unknown_session() {
        let (store, _) = store();
        let err = store.ping("v9").unwrap_err();
        assert!(matches!(err, AppError::SessionNotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ping_refreshes_last_ping() {
        let (store, _) = store();
        store.join_heartbeat("s1", "v1").unwrap();
        let joined_at = store.heartbeat_session("v1").unwrap().last_ping;

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(store.ping("v1").unwrap(), ("s1".to_string(), 1));
        let pinged_at = store.heartbeat_session("v1").unwrap().last_ping;
        assert_eq!(pinged_at - joined_at, Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expire_rechecks_staleness() {
        let (store, _) = store();
        let timeout = Duration::from_secs(60);
        store.join_heartbeat("s1", "v1").unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        let stale = store.stale_heartbeats(Instant::now(), timeout);
        assert_eq!(stale, vec![("v1".to_string(), "s1".to_string())]);

        // A ping between the scan and the eviction saves the session.
        store.ping("v1").unwrap();
        let outcome = store.expire_heartbeat("v1", "s1", Instant::now(), timeout);
        assert!(matches!(outcome, Ok(None)));
        assert_eq!(store.get_heartbeat_count("s1"), 1);
    }

    #[test]
    fn test_push_join_is_idempotent() {
        let (store, _) = store();
        let conn = Uuid::new_v4();
        assert_eq!(store.join_push("s1", conn, ClientMeta::default(), ignore), 1);
        assert_eq!(store.join_push("s1", conn, ClientMeta::default(), ignore), 1);
        assert_eq!(store.get_push_count("s1"), 1);
    }

    #[test]
    fn test_push_join_switches_rooms() {
        let (store, _) = store();
        let conn = Uuid::new_v4();
        let mut seen = Vec::new();

        store.join_push("s1", conn, ClientMeta::default(), ignore);
        store.join_push("s2", conn, ClientMeta::default(), |room| {
            seen.push((room.stream_id.to_string(), room.count()));
        });

        assert_eq!(seen, vec![("s1".to_string(), 0), ("s2".to_string(), 1)]);
        assert_eq!(store.get_push_count("s1"), 0);
        assert_eq!(store.current_room(conn).as_deref(), Some("s2"));
    }

    #[test]
    fn test_push_leave_unknown_connection() {
        let (store, _) = store();
        let mut called = false;
        assert!(store.leave_push(Uuid::new_v4(), |_| called = true).is_none());
        assert!(!called);
    }

    #[test]
    fn test_push_leave_notifies_remaining_members() {
        let (store, _) = store();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store.join_push("s1", a, ClientMeta::default(), ignore);
        store.join_push("s1", b, ClientMeta::default(), ignore);

        let mut remaining = Vec::new();
        let left = store.leave_push(a, |room| remaining.extend(room.members.iter().copied()));
        assert_eq!(left, Some(("s1".to_string(), 1)));
        assert_eq!(remaining, vec![b]);
        assert!(store.push_session(a).is_none());
    }

    #[test]
    fn test_push_session_keeps_metadata() {
        let (store, _) = store();
        let conn = Uuid::new_v4();
        let meta = ClientMeta {
            user_agent: Some("Android TV".to_string()),
            country: Some("AR".to_string()),
        };
        store.join_push("s1", conn, meta.clone(), ignore);
        assert_eq!(store.push_session(conn).unwrap().meta, meta);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_push_joins_lose_no_updates() {
        const N: usize = 200;
        let (store, _) = store();
        let store = Arc::new(store);
        let observed = Arc::new(Mutex::new(Vec::with_capacity(N)));

        let tasks: Vec<_> = (0..N)
            .map(|_| {
                let store = store.clone();
                let observed = observed.clone();
                tokio::spawn(async move {
                    store.join_push("s1", Uuid::new_v4(), ClientMeta::default(), |room| {
                        observed.lock().push(room.count());
                    });
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.get_push_count("s1"), N);
        // Every broadcast saw a distinct size: no two joins raced on one count.
        let mut observed = observed.lock().clone();
        observed.sort_unstable();
        assert_eq!(observed, (1..=N).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_heartbeat_churn() {
        let (store, sink) = store();
        let store = Arc::new(store);

        let tasks: Vec<_> = (0..100)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let viewer = format!("v{i}");
                    store.join_heartbeat("s1", &viewer).unwrap();
                    if i % 2 == 0 {
                        store.leave_heartbeat(&viewer);
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.get_heartbeat_count("s1"), 50);
        assert_eq!(sink.last("s1"), Some(50));
    }

    #[test]
    fn test_racing_moves_leave_viewer_in_one_stream() {
        const ROUNDS: usize = 2000;
        let (store, _) = store();
        let store = Arc::new(store);

        for _ in 0..ROUNDS {
            let barrier = Arc::new(std::sync::Barrier::new(2));
            let handles: Vec<_> = ["s1", "s2"]
                .into_iter()
                .map(|stream_id| {
                    let store = store.clone();
                    let barrier = barrier.clone();
                    std::thread::spawn(move || {
                        barrier.wait();
                        store.join_heartbeat(stream_id, "v").unwrap();
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            // Exactly one set holds the viewer, and it is the session's.
            let (session_stream, _) = store.ping("v").unwrap();
            assert_eq!(store.get_heartbeat_count("s1") + store.get_heartbeat_count("s2"), 1);
            assert_eq!(store.get_heartbeat_count(&session_stream), 1);

            store.leave_heartbeat("v");
            assert_eq!(store.get_heartbeat_count("s1") + store.get_heartbeat_count("s2"), 0);
        }
    }

    #[test]
    fn test_refused_push_join_leaves_no_member() {
        let (store, _) = store();
        let conn = Uuid::new_v4();
        store.join_push("s1", conn, ClientMeta::default(), ignore);

        let mut seen = Vec::new();
        let joined = store.join_push_if("s2", conn, ClientMeta::default(), || false, |room| {
            seen.push((room.stream_id.to_string(), room.count()));
        });

        assert_eq!(joined, None);
        // Only the old room heard about the move.
        assert_eq!(seen, vec![("s1".to_string(), 0)]);
        assert_eq!(store.get_push_count("s2"), 0);
        assert!(store.current_room(conn).is_none());
        assert!(store.with_room("s2", |_| ()).is_none());
    }

    #[tokio::test]
    async fn test_clear_stream_drops_both_paths() {
        let (store, _) = store();
        let conn = Uuid::new_v4();
        store.join_push("s1", conn, ClientMeta::default(), ignore);
        store.join_heartbeat("s1", "v1").unwrap();
        store.join_heartbeat("s2", "v2").unwrap();

        let cleared = store.clear_stream("s1");
        assert_eq!(cleared.connections, vec![conn]);
        assert_eq!(cleared.viewers, 1);
        assert_eq!(store.get_push_count("s1"), 0);
        assert_eq!(store.get_heartbeat_count("s1"), 0);
        assert!(store.current_room(conn).is_none());
        assert!(store.heartbeat_session("v1").is_none());
        assert_eq!(store.get_heartbeat_count("s2"), 1);
    }
}

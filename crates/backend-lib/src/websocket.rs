// ==================
// crates/backend-lib/src/websocket.rs
// ==================
//! Push-channel connection handler.
//!
//! One `ConnectionHandler` lives per socket and walks the connection state
//! machine: connected with no room, in exactly one room, closed. Client
//! events are applied to the presence and like stores, and the resulting
//! state is published to the affected room through the [`RoomHub`].
//!
//! Errors never leave the connection: they are answered with an `error`
//! event (or `like-error` for likes) sent to the caller only.
//!
//! [`RoomHub`]: crate::hub::RoomHub

use std::collections::HashSet;
use std::sync::Arc;

use cosmictv_common::{ClientEvent, ServerEvent, StreamId};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::AppError;
use crate::presence::{ClientMeta, ConnectionId, RoomView};
use crate::validation::{validate_client_id, validate_stream_id};
use crate::AppState;

/// Error code sent back for frames that are not a known client event
pub const MALFORMED: &str = "MALFORMED";

/// Per-connection handler
pub struct ConnectionHandler {
    state: Arc<AppState>,
    conn_id: ConnectionId,
    /// User agent from the upgrade request, used when a join omits one
    user_agent: Option<String>,
    /// Streams liked with the connection id as voter
    voted: HashSet<StreamId>,
}

impl ConnectionHandler {
    /// Register a new connection and return its outbox
    pub fn connect(
        state: Arc<AppState>,
        user_agent: Option<String>,
    ) -> (Self, mpsc::Receiver<ServerEvent>) {
        let conn_id = Uuid::new_v4();
        let outbox = state.hub.register(conn_id);
        tracing::debug!(%conn_id, "push connection opened");

        let handler = Self {
            state,
            conn_id,
            user_agent,
            voted: HashSet::new(),
        };
        (handler, outbox)
    }

    pub fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }

    /// Handle one text frame
    pub fn handle_text(&mut self, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => {
                if let Err(err) = self.handle_event(event) {
                    tracing::debug!(conn_id = %self.conn_id, error = %err, "client event rejected");
                    self.reply(err.to_server_event());
                }
            },
            Err(err) => {
                tracing::debug!(conn_id = %self.conn_id, error = %err, "malformed frame");
                self.reply(ServerEvent::Error {
                    code: MALFORMED.to_string(),
                    message: err.to_string(),
                });
            },
        }
    }

    /// Apply a parsed client event
    pub fn handle_event(&mut self, event: ClientEvent) -> Result<(), AppError> {
        match event {
            ClientEvent::JoinChannel {
                channel_id,
                user_agent,
                country,
            } => {
                let meta = ClientMeta {
                    user_agent: user_agent.or_else(|| self.user_agent.clone()),
                    country,
                };
                self.join(&channel_id, meta).map(|_| ())
            },
            ClientEvent::LeaveChannel(channel_id) => self.leave(&channel_id),
            ClientEvent::LikeChannel {
                channel_id,
                user_id,
            } => {
                self.like(&channel_id, user_id.as_deref());
                Ok(())
            },
        }
    }

    /// Enter a room, leaving the current one first.
    ///
    /// The joiner gets `joined-channel`, then every member (joiner included)
    /// gets the new count.
    pub fn join(&mut self, stream_id: &str, meta: ClientMeta) -> Result<usize, AppError> {
        validate_stream_id(stream_id)?;
        if !self.state.catalog.exists(stream_id) {
            return Err(AppError::stream_not_found(stream_id));
        }

        let conn_id = self.conn_id;
        let hub = &self.state.hub;
        let catalog = &self.state.catalog;
        // A deletion racing this join either finds us in the room and evicts
        // us, or has already removed the stream and the join is refused.
        let admit = || catalog.exists(stream_id);
        let count = self
            .state
            .presence
            .join_push_if(stream_id, conn_id, meta, admit, |room: RoomView<'_>| {
                if room.stream_id == stream_id {
                    hub.send_to(
                        conn_id,
                        ServerEvent::JoinedChannel {
                            channel_id: stream_id.to_string(),
                            viewer_count: room.count(),
                        },
                    );
                }
                hub.broadcast(room, &ServerEvent::viewer_count(room.stream_id, room.count()));
            })
            .ok_or_else(|| AppError::stream_not_found(stream_id))?;

        tracing::info!(%conn_id, stream_id, count, "joined room");
        Ok(count)
    }

    /// Leave a room. Leaving a room the connection is not in does nothing.
    pub fn leave(&mut self, stream_id: &str) -> Result<(), AppError> {
        if self.state.presence.current_room(self.conn_id).as_deref() != Some(stream_id) {
            return Ok(());
        }
        self.leave_current();
        Ok(())
    }

    /// Like a stream once per voter.
    ///
    /// On success the room gets `like-update` and the caller `like-confirmed`;
    /// any failure goes to the caller alone as `like-error`.
    pub fn like(&mut self, stream_id: &str, user_id: Option<&str>) {
        let reply = match self.try_like(stream_id, user_id) {
            Ok(likes) => ServerEvent::LikeConfirmed {
                channel_id: stream_id.to_string(),
                likes,
            },
            Err(err) => ServerEvent::LikeError {
                message: err.sanitized_message(),
            },
        };
        self.reply(reply);
    }

    fn try_like(&mut self, stream_id: &str, user_id: Option<&str>) -> Result<u64, AppError> {
        validate_stream_id(stream_id)?;
        if !self.state.catalog.exists(stream_id) {
            return Err(AppError::stream_not_found(stream_id));
        }

        let voter = match user_id {
            Some(user_id) => validate_client_id("userId", user_id)?.to_string(),
            None => self.conn_id.to_string(),
        };

        let state = &self.state;
        let likes = state.likes.vote_then(stream_id, &voter, |likes| {
            state.presence.with_room(stream_id, |room| {
                state
                    .hub
                    .broadcast(room, &ServerEvent::like_update(stream_id, likes))
            });
        })?;

        if user_id.is_none() {
            self.voted.insert(stream_id.to_string());
        }
        tracing::info!(conn_id = %self.conn_id, stream_id, likes, "stream liked");
        Ok(likes)
    }

    /// Tear the connection down: implicit leave, then drop all its state
    pub fn disconnect(self) {
        self.leave_current();
        for stream_id in &self.voted {
            self.state
                .likes
                .release_voter(stream_id, &self.conn_id.to_string());
        }
        self.state.hub.unregister(self.conn_id);
        tracing::debug!(conn_id = %self.conn_id, "push connection closed");
    }

    fn leave_current(&self) {
        let hub = &self.state.hub;
        if let Some((stream_id, count)) = self.state.presence.leave_push(self.conn_id, |room| {
            hub.broadcast(room, &ServerEvent::viewer_count(room.stream_id, room.count()));
        }) {
            tracing::info!(conn_id = %self.conn_id, stream_id = %stream_id, count, "left room");
        }
    }

    fn reply(&self, event: ServerEvent) {
        self.state.hub.send_to(self.conn_id, event);
    }
}

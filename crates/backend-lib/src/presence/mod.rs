//! Viewer presence: session store plus heartbeat expiry.

pub mod store;
pub mod sweeper;

pub use store::{
    ClearedStream, ClientMeta, ConnectionId, HeartbeatSession, PresenceStore, PushSession,
    RoomView, ViewerCountSink, ViewerId,
};
pub use sweeper::{HeartbeatSweeper, SweepReport};

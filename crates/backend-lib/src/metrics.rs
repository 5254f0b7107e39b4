// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const WS_CONNECTION: &str = "ws.connection";
pub const WS_DISCONNECTION: &str = "ws.disconnection";
pub const WS_ACTIVE: &str = "ws.active";
pub const WS_OUTBOX_DROPPED: &str = "ws.outbox_dropped";
pub const PUSH_JOINED: &str = "presence.push_joined";
pub const HEARTBEAT_JOINED: &str = "presence.heartbeat_joined";
pub const HEARTBEAT_EVICTED: &str = "presence.heartbeat_evicted";
pub const HEARTBEAT_ACTIVE: &str = "presence.heartbeat_active";
pub const SWEEP_FAILURES: &str = "presence.sweep_failures";
pub const CHAT_POSTED: &str = "chat.posted";
pub const LIKE_TOGGLED: &str = "likes.toggled";
pub const RATE_LIMITED: &str = "admin.rate_limited";

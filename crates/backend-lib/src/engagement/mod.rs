//! Chat and like stores. Both share the presence lifecycle: created on first
//! activity, cleared when the stream is deleted.

pub mod chat;
pub mod likes;

pub use chat::{ChatPage, ChatStore};
pub use likes::{LikeState, LikeStore};

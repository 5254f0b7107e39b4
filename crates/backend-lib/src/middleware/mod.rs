// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the admin router.

pub mod admin_auth;
pub mod rate_limit;

pub use admin_auth::require_admin;
pub use rate_limit::{rate_limit, RateLimiter};

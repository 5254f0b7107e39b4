// ============================
// cosmictv-backend-lib/src/lib.rs
// ============================
//! Core backend functionality for the `CosmicTV` server: viewer presence over
//! a push channel and REST heartbeats, chat, likes and the stream catalog.

pub mod catalog;
pub mod config;
pub mod engagement;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod metrics;
pub mod middleware;
pub mod presence;
pub mod validation;
pub mod websocket;
pub mod ws_router;

use std::any::Any;
use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::catalog::StreamCatalog;
use crate::config::Settings;
use crate::engagement::{ChatStore, LikeStore};
use crate::error::AppError;
use crate::hub::RoomHub;
use crate::middleware::RateLimiter;
use crate::presence::{HeartbeatSweeper, PresenceStore};

/// Application state shared across all handlers
pub struct AppState {
    /// Settings the server was started with
    pub settings: Arc<Settings>,
    /// Known streams
    pub catalog: Arc<StreamCatalog>,
    /// Push and heartbeat sessions
    pub presence: Arc<PresenceStore>,
    pub chat: Arc<ChatStore>,
    pub likes: Arc<LikeStore>,
    /// Outboxes of live push connections
    pub hub: Arc<RoomHub>,
    /// Admin router limiter
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Create a new application state with the default channel line-up
    pub fn new(settings: Settings) -> Self {
        Self::with_catalog(settings, StreamCatalog::with_defaults())
    }

    /// Create a new application state around an existing catalog
    pub fn with_catalog(settings: Settings, catalog: StreamCatalog) -> Self {
        let catalog = Arc::new(catalog);
        let presence = Arc::new(PresenceStore::new(catalog.clone()));

        Self {
            chat: Arc::new(ChatStore::new(settings.chat.clone())),
            likes: Arc::new(LikeStore::new()),
            hub: Arc::new(RoomHub::new(settings.gateway.outbox_capacity)),
            rate_limiter: Arc::new(RateLimiter::new(&settings.rate_limit)),
            settings: Arc::new(settings),
            catalog,
            presence,
        }
    }

    /// Sweeper over this state's heartbeat sessions
    pub fn sweeper(&self) -> HeartbeatSweeper {
        HeartbeatSweeper::new(self.presence.clone(), &self.settings.presence)
    }
}

/// Build the full HTTP router: health, REST API, admin API and push channel
pub fn build_router(state: Arc<AppState>) -> Router {
    use crate::handlers::{admin, health, streams};

    let admin_routes = Router::new()
        .route("/streams", post(admin::create_stream))
        .route("/streams/{id}", delete(admin::delete_stream))
        .route("/streams/{id}/chat", delete(admin::clear_chat))
        .layer(from_fn_with_state(state.clone(), middleware::require_admin))
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit));

    let api_routes = Router::new()
        .route("/streams", get(streams::list_streams))
        .route("/streams/likes/summary", get(streams::likes_summary))
        .route("/streams/{id}", get(streams::get_stream))
        .route("/streams/{id}/join", post(streams::join))
        .route("/streams/{id}/leave", post(streams::leave))
        .route("/streams/{id}/ping", post(streams::ping))
        .route("/streams/{id}/viewers", get(streams::viewers))
        .route("/streams/{id}/like", post(streams::toggle_like))
        .route("/streams/{id}/likes", get(streams::get_likes))
        .route(
            "/streams/{id}/chat",
            get(streams::get_chat).post(streams::post_chat),
        )
        .nest("/admin", admin_routes);

    Router::new()
        .route("/health", get(health))
        .merge(ws_router::routes())
        .nest("/api", api_routes)
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("route".to_string())
}

/// Answer a panicked handler with the regular JSON error body
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "handler panicked".to_string()
    };
    AppError::Internal(detail).into_response()
}

//! Fixed-window request limiter keyed by client address.
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use metrics::counter;
use tokio::time::Instant;

use crate::config::RateLimitSettings;
use crate::metrics::RATE_LIMITED;
use crate::{error::AppError, AppState};

/// Rate limit entry for a client
#[derive(Debug)]
struct RateLimitEntry {
    requests: u32,
    window_start: Instant,
}

/// Per-client request budget
#[derive(Debug)]
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        Self {
            entries: DashMap::new(),
            max_requests: settings.max_requests,
            window: Duration::from_secs(settings.window_secs),
        }
    }

    /// Count one request; false once the client's budget for the window is spent
    pub fn check(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(client.to_string())
            .or_insert_with(|| RateLimitEntry {
                requests: 0,
                window_start: now,
            });

        // Check if window has expired
        if now.saturating_duration_since(entry.window_start) > self.window {
            entry.requests = 0;
            entry.window_start = now;
        }

        if entry.requests >= self.max_requests {
            return false;
        }
        entry.requests += 1;
        true
    }

    /// Forget clients whose window has passed
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.window_start) <= self.window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.entries.len()
    }
}

/// Client key: first `x-forwarded-for` hop, else `x-real-ip`
fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|h| h.to_str().ok()))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Rate limiter middleware
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_key(request.headers());

    if !state.rate_limiter.check(&client) {
        counter!(RATE_LIMITED).increment(1);
        tracing::warn!(client = %client, "admin rate limit exceeded");
        return Err(AppError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(&RateLimitSettings {
            max_requests,
            window_secs: 60,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_per_window() {
        let limiter = limiter(2);
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
        // Other clients have their own budget.
        assert!(limiter.check("5.6.7.8"));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.check("1.2.3.4"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_drops_expired_windows() {
        let limiter = limiter(5);
        limiter.check("1.2.3.4");
        tokio::time::advance(Duration::from_secs(30)).await;
        limiter.check("5.6.7.8");

        tokio::time::advance(Duration::from_secs(31)).await;
        limiter.cleanup();
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_client_key() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_key(&headers), "10.0.0.2");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_key(&headers), "203.0.113.7");
    }
}

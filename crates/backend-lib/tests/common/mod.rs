//! Test utilities shared by the integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use cosmictv_backend_lib::{build_router, config::Settings, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const ADMIN_KEY: &str = "test-admin-key";

/// State with the default line-up and an admin key configured
pub fn setup_state() -> Arc<AppState> {
    let settings = Settings {
        admin_api_key: Some(ADMIN_KEY.to_string()),
        ..Settings::default()
    };
    Arc::new(AppState::new(settings))
}

/// Router and the state behind it
pub fn setup_app() -> (Router, Arc<AppState>) {
    let state = setup_state();
    (build_router(state.clone()), state)
}

/// Fire one request through the router and decode the JSON answer
pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        },
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    call(app, Method::GET, uri, None, &[]).await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    call(app, Method::POST, uri, Some(body), &[]).await
}

pub async fn admin(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    call(app, method, uri, body, &[("x-api-key", ADMIN_KEY)]).await
}

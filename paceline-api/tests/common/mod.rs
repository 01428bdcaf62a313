//! Shared helpers for API integration tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use paceline_api::{create_api_router, ApiConfig, AppState, Stores, SystemClock};
use paceline_store::MemoryStore;

/// App plus handles the tests assert against.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: MemoryStore,
}

pub fn spawn_app(store: MemoryStore, config: ApiConfig) -> TestApp {
    let state = AppState::new(
        Stores::memory(store.clone()),
        config,
        Arc::new(SystemClock),
    );
    let router = create_api_router(state.clone());
    TestApp {
        router,
        state,
        store,
    }
}

pub fn spawn_default_app(store: MemoryStore) -> TestApp {
    spawn_app(store, ApiConfig::default())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request should not fail at the transport level");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, value)
}

pub async fn get_authed(app: &Router, path: &str, token: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(path)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .expect("request builds");
    send(app, request).await
}

pub async fn get_anon(app: &Router, path: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request builds");
    send(app, request).await
}

pub async fn post_authed(
    app: &Router,
    path: &str,
    token: &str,
    body: Value,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds");
    send(app, request).await
}

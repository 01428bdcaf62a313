//! REST API Routes Module
//!
//! Route handlers grouped by concern:
//! - Report reads (progress pages, sync-status view)
//! - Admin operations (cache maintenance, sync recording, config view)
//! - Health check endpoints (Kubernetes-compatible)
//! - CORS support for browser-based clients

pub mod admin;
pub mod health;
pub mod report;

use std::time::Duration;

use axum::{
    http::{header, header::HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, AuthMiddlewareState};
use crate::openapi::ApiDoc;
use crate::state::AppState;

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ============================================================================
// CORS LAYER
// ============================================================================

/// Build the CORS layer from ApiConfig.
///
/// With no configured origins every origin is allowed; with configured
/// origins only those are allowed.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: allowing all origins");
        cors.allow_origin(Any).allow_headers(Any)
    } else {
        tracing::info!("CORS: allowing origins: {:?}", config.cors_origins);
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins).allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-api-key"),
        ])
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the complete API router.
///
/// - Report and admin routes under /api/v1/* sit behind credential auth
/// - /health/* and /openapi.json are public
pub fn create_api_router(state: AppState) -> Router {
    let auth_state = AuthMiddlewareState::new(
        state.stores.credentials.clone(),
        state.stores.request_log.clone(),
        state.clock.clone(),
    );

    let report_routes = Router::new()
        .route("/progress", get(report::get_progress))
        .route("/sync-status", get(report::get_sync_status));

    let admin_routes = Router::new()
        .route("/cache/clear", post(admin::clear_cache))
        .route("/cache/purge", post(admin::purge_cache))
        .route("/sync-status", post(admin::record_sync_status))
        .route("/config", get(admin::get_effective_config));

    let protected = Router::new()
        .nest("/report", report_routes)
        .nest("/admin", admin_routes)
        .layer(from_fn_with_state(auth_state, auth_middleware));

    let health_routes = Router::new()
        .route("/ping", get(health::ping))
        .route("/live", get(health::liveness))
        .route("/ready", get(health::readiness));

    let cors = build_cors_layer(&state.config);

    Router::new()
        .nest("/api/v1", protected)
        .nest("/health", health_routes)
        .route("/openapi.json", get(openapi_json))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::auth::SystemClock;
    use crate::state::Stores;
    use paceline_store::MemoryStore;

    #[tokio::test]
    async fn test_router_builds_with_memory_backend() {
        let state = AppState::new(
            Stores::memory(MemoryStore::new()),
            ApiConfig::default(),
            Arc::new(SystemClock),
        );
        let _router = create_api_router(state);
    }

    #[test]
    fn test_cors_layer_with_configured_origins() {
        let config = ApiConfig {
            cors_origins: vec!["https://app.example.com".to_string()],
            ..ApiConfig::default()
        };
        let _cors = build_cors_layer(&config);
    }
}

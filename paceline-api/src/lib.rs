//! Paceline REST API
//!
//! Axum-based HTTP surface over the progress reporting engine. Request
//! flow: credential auth, per-tenant config, daily rate limit, sync-mode
//! classification, response-cache probe, snapshot query (with live
//! fallback), projection, cache store, request log.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;

pub use auth::{authenticate, AuthContext, AuthRejection, Clock, FixedClock, SystemClock};
pub use config::ApiConfig;
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use extractors::ApiQuery;
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use services::{ReportService, RequestMeta, SyncService};
pub use state::{AppState, Stores};

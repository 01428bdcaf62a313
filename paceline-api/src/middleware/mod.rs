//! Middleware modules for the Paceline API
//!
//! Authentication runs on every `/api/v1` route and injects an
//! [`crate::auth::AuthContext`] into request extensions. Health and OpenAPI
//! routes are mounted outside this middleware.

mod auth;

pub use auth::{auth_middleware, AuthExtractor, AuthMiddlewareError, AuthMiddlewareState};

//! Axum Middleware for Authentication
//!
//! This middleware:
//! - Extracts credentials from `Authorization: Bearer` or `X-API-Key`
//! - Resolves them against the credential store
//! - Returns 401 for unauthenticated requests
//! - Records a failed request-log entry when the rejected credential still
//!   resolved to a caller
//! - Injects AuthContext into request extensions on success

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use paceline_core::{new_entity_id, RequestLogEntry, RequestOutcome};
use paceline_store::{CredentialStore, RequestLogStore};
use tracing::warn;

use crate::auth::{authenticate, AuthContext, Clock};
use crate::error::ApiError;

// ============================================================================
// MIDDLEWARE STATE
// ============================================================================

/// Shared state for authentication middleware, passed via Axum's State
/// extractor.
#[derive(Clone)]
pub struct AuthMiddlewareState {
    pub credentials: Arc<dyn CredentialStore>,
    pub request_log: Arc<dyn RequestLogStore>,
    pub clock: Arc<dyn Clock>,
}

impl AuthMiddlewareState {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        request_log: Arc<dyn RequestLogStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials,
            request_log,
            clock,
        }
    }
}

// ============================================================================
// MIDDLEWARE FUNCTION
// ============================================================================

/// Axum middleware for authentication.
///
/// ```ignore
/// let app = Router::new()
///     .route("/api/v1/report/progress", axum::routing::get(handler))
///     .layer(middleware::from_fn_with_state(auth_state, auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthMiddlewareError> {
    let auth_header = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);

    let api_key_header = request
        .headers()
        .get("x-api-key")
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);

    let auth_context = match authenticate(
        &state.credentials,
        &state.clock,
        auth_header.as_deref(),
        api_key_header.as_deref(),
    )
    .await
    {
        Ok(context) => context,
        Err(rejection) => {
            // A rejection that still resolved a caller (e.g. an expired
            // credential) gets a failed request-log entry; anonymous
            // rejections have no tenant to log under.
            if let Some(context) = &rejection.context {
                log_auth_failure(&state, context, request.uri().path(), &rejection.error).await;
            }
            return Err(AuthMiddlewareError(rejection.error));
        }
    };

    // Inject AuthContext into request extensions
    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

async fn log_auth_failure(
    state: &AuthMiddlewareState,
    context: &AuthContext,
    endpoint: &str,
    error: &ApiError,
) {
    let entry = RequestLogEntry {
        entry_id: new_entity_id(),
        tenant_id: context.tenant_id,
        identity_id: context.identity_id,
        endpoint: endpoint.to_string(),
        outcome: RequestOutcome::Failed,
        record_count: 0,
        error: Some(error.message.clone()),
        latency_ms: 0,
        client_ip: None,
        user_agent: None,
        created_at: state.clock.now(),
    };
    if let Err(err) = state.request_log.append(&entry).await {
        warn!(tenant_id = %context.tenant_id, error = %err, "failed to append request log entry");
    }
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

/// Error wrapper for middleware that implements IntoResponse, so auth
/// failures become JSON error responses with the right status code.
#[derive(Debug)]
pub struct AuthMiddlewareError(pub ApiError);

impl IntoResponse for AuthMiddlewareError {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

// ============================================================================
// TYPED EXTRACTOR
// ============================================================================

/// Typed Axum extractor for authentication context.
///
/// Requires `auth_middleware` on the route; without it the extractor
/// rejects with a 500.
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = AuthMiddlewareError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthExtractor)
            .ok_or_else(|| {
                AuthMiddlewareError(ApiError::internal_error(
                    "AuthContext not found in request extensions. \
                     Ensure auth_middleware is applied to this route.",
                ))
            })
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

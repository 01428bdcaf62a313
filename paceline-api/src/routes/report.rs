//! Report Endpoints
//!
//! The paginated progress report and the caller's sync-status view. Both
//! sit behind the authentication middleware; the progress read is the only
//! endpoint counted against the daily quota.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use paceline_core::{SyncOutcome, Timestamp};

use crate::error::{ApiError, ApiResult};
use crate::extractors::ApiQuery;
use crate::middleware::AuthExtractor;
use crate::services::RequestMeta;
use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

/// Pagination parameters for the progress report.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct ProgressParams {
    /// Page size. Defaults to the server's page limit; capped at its maximum.
    pub limit: Option<i64>,
    /// Row offset. Defaults to 0.
    pub offset: Option<i64>,
}

/// The caller's sync-status view.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SyncStatusResponse {
    pub synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub last_synced_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "success")]
    pub outcome: Option<SyncOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================================
// HANDLERS
// ============================================================================

fn request_meta(headers: &axum::http::HeaderMap) -> RequestMeta {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    RequestMeta {
        client_ip: header_str("x-forwarded-for")
            .map(|v| v.split(',').next().unwrap_or("").trim().to_string())
            .filter(|v| !v.is_empty()),
        user_agent: header_str("user-agent"),
    }
}

/// GET /api/v1/report/progress - One page of the course progress report
#[utoipa::path(
    get,
    path = "/api/v1/report/progress",
    tag = "Report",
    params(ProgressParams),
    responses(
        (status = 200, description = "One page of progress records", body = Object),
        (status = 400, description = "Malformed pagination parameters", body = ApiError),
        (status = 401, description = "Missing or invalid credentials", body = ApiError),
        (status = 429, description = "Daily quota exhausted", body = ApiError),
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
)]
pub async fn get_progress(
    State(state): State<AppState>,
    auth: AuthExtractor,
    params: Result<ApiQuery<ProgressParams>, ApiError>,
    headers: axum::http::HeaderMap,
) -> ApiResult<Json<Value>> {
    let meta = request_meta(&headers);
    let ApiQuery(params) = match params {
        Ok(params) => params,
        Err(err) => {
            state.report.record_rejection(&auth, &err, &meta).await;
            return Err(err);
        }
    };

    let payload = state
        .report
        .progress(&auth, params.limit, params.offset, &meta)
        .await?;
    Ok(Json(payload))
}

/// GET /api/v1/report/sync-status - Sync status for the caller's credential
#[utoipa::path(
    get,
    path = "/api/v1/report/sync-status",
    tag = "Report",
    responses(
        (status = 200, description = "Current sync status", body = SyncStatusResponse),
        (status = 401, description = "Missing or invalid credentials", body = ApiError),
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
)]
pub async fn get_sync_status(
    State(state): State<AppState>,
    auth: AuthExtractor,
) -> ApiResult<Json<SyncStatusResponse>> {
    let status = state
        .sync
        .current(auth.tenant_id, &auth.credential_hash)
        .await?;

    let response = match status {
        Some(status) => SyncStatusResponse {
            synced: true,
            last_synced_at: Some(status.last_synced_at),
            outcome: Some(status.outcome),
            message: status.message,
        },
        None => SyncStatusResponse {
            synced: false,
            last_synced_at: None,
            outcome: None,
            message: None,
        },
    };
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_meta_takes_first_forwarded_ip() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.9, 10.0.0.1".parse().unwrap(),
        );
        headers.insert("user-agent", "paceline-test".parse().unwrap());

        let meta = request_meta(&headers);
        assert_eq!(meta.client_ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(meta.user_agent.as_deref(), Some("paceline-test"));
    }

    #[test]
    fn test_sync_status_response_omits_absent_fields() {
        let response = SyncStatusResponse {
            synced: false,
            last_synced_at: None,
            outcome: None,
            message: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, "{\"synced\":false}");
    }
}

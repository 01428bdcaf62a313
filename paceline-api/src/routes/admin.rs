//! Admin Endpoints
//!
//! Cache maintenance, sync-status recording for batch jobs, and the
//! effective-config view. Authenticated but not counted against the
//! daily quota.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use paceline_core::{EntityId, SyncOutcome, Timestamp};

use crate::error::{ApiError, ApiResult};
use crate::extractors::ApiQuery;
use crate::middleware::AuthExtractor;
use crate::routes::report::SyncStatusResponse;
use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

/// Cache clear scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    #[default]
    Tenant,
    All,
}

#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
pub struct CacheClearParams {
    /// `tenant` (default) clears the caller's tenant; `all` clears everything.
    pub scope: Option<CacheScope>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CacheClearResponse {
    pub scope: String,
    pub cleared: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CachePurgeResponse {
    pub purged: u64,
}

/// Body for recording the outcome of a batch sync run.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct RecordSyncRequest {
    /// Credential fingerprint the run synced for. Defaults to the caller's.
    pub credential_hash: Option<String>,
    /// When the run finished. Defaults to now.
    #[schema(value_type = Option<String>, format = DateTime)]
    pub last_synced_at: Option<Timestamp>,
    #[schema(value_type = String, example = "success")]
    pub outcome: SyncOutcome,
    pub message: Option<String>,
}

/// Effective per-tenant configuration after server defaults are applied.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EffectiveConfigResponse {
    #[schema(value_type = String, format = Uuid)]
    pub tenant_id: EntityId,
    pub name: String,
    pub daily_quota: i64,
    pub cache_enabled: bool,
    pub cache_ttl_minutes: i64,
    pub configured_courses: Option<usize>,
    pub enabled_fields: Vec<String>,
    pub first_sync_hours: Option<i64>,
    pub force_full_sync: bool,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// POST /api/v1/admin/cache/clear - Invalidate cached report pages
#[utoipa::path(
    post,
    path = "/api/v1/admin/cache/clear",
    tag = "Admin",
    params(CacheClearParams),
    responses(
        (status = 200, description = "Entries removed", body = CacheClearResponse),
        (status = 401, description = "Missing or invalid credentials", body = ApiError),
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
)]
pub async fn clear_cache(
    State(state): State<AppState>,
    auth: AuthExtractor,
    ApiQuery(params): ApiQuery<CacheClearParams>,
) -> ApiResult<Json<CacheClearResponse>> {
    let scope = params.scope.unwrap_or_default();
    let (label, cleared) = match scope {
        CacheScope::Tenant => ("tenant", state.cache.clear_tenant(auth.tenant_id).await?),
        CacheScope::All => ("all", state.cache.clear_all().await?),
    };
    Ok(Json(CacheClearResponse {
        scope: label.to_string(),
        cleared,
    }))
}

/// POST /api/v1/admin/cache/purge - Remove expired cache entries
#[utoipa::path(
    post,
    path = "/api/v1/admin/cache/purge",
    tag = "Admin",
    responses(
        (status = 200, description = "Expired entries removed", body = CachePurgeResponse),
        (status = 401, description = "Missing or invalid credentials", body = ApiError),
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
)]
pub async fn purge_cache(
    State(state): State<AppState>,
    _auth: AuthExtractor,
) -> ApiResult<Json<CachePurgeResponse>> {
    let purged = state.cache.purge_expired().await?;
    Ok(Json(CachePurgeResponse { purged }))
}

/// POST /api/v1/admin/sync-status - Record a batch sync run
#[utoipa::path(
    post,
    path = "/api/v1/admin/sync-status",
    tag = "Admin",
    request_body = RecordSyncRequest,
    responses(
        (status = 200, description = "Recorded status", body = SyncStatusResponse),
        (status = 401, description = "Missing or invalid credentials", body = ApiError),
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
)]
pub async fn record_sync_status(
    State(state): State<AppState>,
    auth: AuthExtractor,
    Json(body): Json<RecordSyncRequest>,
) -> ApiResult<Json<SyncStatusResponse>> {
    let credential_hash = body
        .credential_hash
        .unwrap_or_else(|| auth.credential_hash.clone());
    let last_synced_at = body.last_synced_at.unwrap_or_else(|| state.clock.now());

    let status = state
        .sync
        .record(
            auth.tenant_id,
            credential_hash,
            last_synced_at,
            body.outcome,
            body.message,
        )
        .await?;

    Ok(Json(SyncStatusResponse {
        synced: true,
        last_synced_at: Some(status.last_synced_at),
        outcome: Some(status.outcome),
        message: status.message,
    }))
}

/// GET /api/v1/admin/config - Effective configuration for the caller's tenant
#[utoipa::path(
    get,
    path = "/api/v1/admin/config",
    tag = "Admin",
    responses(
        (status = 200, description = "Effective configuration", body = EffectiveConfigResponse),
        (status = 401, description = "Missing or invalid credentials", body = ApiError),
        (status = 404, description = "Tenant has no configuration", body = ApiError),
    ),
    security(("bearer_auth" = []), ("api_key" = [])),
)]
pub async fn get_effective_config(
    State(state): State<AppState>,
    auth: AuthExtractor,
) -> ApiResult<Json<EffectiveConfigResponse>> {
    let config = state
        .tenant_configs
        .get(auth.tenant_id)
        .await?
        .ok_or_else(|| ApiError::tenant_not_found(auth.tenant_id))?;

    let enabled_fields = config
        .field_flags
        .enabled_names_sorted()
        .into_iter()
        .map(str::to_string)
        .collect();

    Ok(Json(EffectiveConfigResponse {
        tenant_id: config.tenant_id,
        name: config.name.clone(),
        daily_quota: config.effective_quota(state.config.default_daily_quota),
        cache_enabled: config.cache_enabled,
        cache_ttl_minutes: config.cache_ttl_minutes,
        configured_courses: config.course_settings.as_ref().map(Vec::len),
        enabled_fields,
        first_sync_hours: config.first_sync_hours,
        force_full_sync: config.force_full_sync,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_scope_parses_lowercase() {
        let scope: CacheScope = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(scope, CacheScope::All);
        assert_eq!(CacheScope::default(), CacheScope::Tenant);
    }

    #[test]
    fn test_record_sync_request_defaults() {
        let body: RecordSyncRequest =
            serde_json::from_str("{\"outcome\":\"success\"}").unwrap();
        assert!(body.credential_hash.is_none());
        assert!(body.last_synced_at.is_none());
        assert_eq!(body.outcome, SyncOutcome::Success);
    }
}

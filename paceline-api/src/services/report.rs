//! The per-request report pipeline.
//!
//! Order per request: pagination validation, tenant config, rate limit,
//! sync-mode classification, cache-key derivation, cache probe, query,
//! projection, cache store, request log. Outcomes other than rate-limit
//! rejections always write a log entry, validation failures included.
//! Rate-limit rejections are the one outcome that never writes
//! an ordinary log entry; the limiter's single boundary violation row is the
//! only trace they leave.

use std::sync::Arc;
use std::time::Instant;

use paceline_core::{
    new_entity_id, project_row, resolve_sync_mode, CacheKeyParams, CourseSelection,
    RequestLogEntry, RequestOutcome,
};
use paceline_store::RequestLogStore;
use serde_json::{json, Value};
use tracing::warn;

use crate::auth::{AuthContext, Clock};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::services::{QueryEngine, RateLimiter, ResponseCache, SyncService, TenantConfigCache};

/// Endpoint label used in request-log entries for the report read.
pub const PROGRESS_ENDPOINT: &str = "/api/v1/report/progress";

/// Client metadata captured for the request log.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Orchestrates one progress-report read end to end.
pub struct ReportService {
    tenant_configs: Arc<TenantConfigCache>,
    limiter: Arc<RateLimiter>,
    sync: Arc<SyncService>,
    engine: Arc<QueryEngine>,
    cache: Arc<ResponseCache>,
    request_log: Arc<dyn RequestLogStore>,
    clock: Arc<dyn Clock>,
    config: ApiConfig,
}

impl ReportService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_configs: Arc<TenantConfigCache>,
        limiter: Arc<RateLimiter>,
        sync: Arc<SyncService>,
        engine: Arc<QueryEngine>,
        cache: Arc<ResponseCache>,
        request_log: Arc<dyn RequestLogStore>,
        clock: Arc<dyn Clock>,
        config: ApiConfig,
    ) -> Self {
        Self {
            tenant_configs,
            limiter,
            sync,
            engine,
            cache,
            request_log,
            clock,
            config,
        }
    }

    /// Serve one page of the progress report, logging the outcome.
    ///
    /// Pagination is validated here rather than in the handler so rejected
    /// parameters still leave a `Failed` request-log entry for the caller.
    pub async fn progress(
        &self,
        auth: &AuthContext,
        limit: Option<i64>,
        offset: Option<i64>,
        meta: &RequestMeta,
    ) -> ApiResult<Value> {
        let started = Instant::now();
        let result = self.progress_inner(auth, limit, offset).await;

        let latency_ms = started.elapsed().as_millis() as i64;
        match &result {
            Ok(payload) => {
                let record_count = payload
                    .get("record_count")
                    .and_then(Value::as_i64)
                    .unwrap_or(0);
                self.append_log(auth, RequestOutcome::Success, record_count, None, latency_ms, meta)
                    .await;
            }
            // Rate-limit rejections leave only the limiter's violation row.
            Err(err) if err.code == ErrorCode::TooManyRequests => {}
            Err(err) => {
                self.append_log(
                    auth,
                    RequestOutcome::Failed,
                    0,
                    Some(err.message.clone()),
                    latency_ms,
                    meta,
                )
                .await;
            }
        }

        result
    }

    /// Record a request that was rejected before the pipeline ran, such as
    /// a malformed query string, under the caller's tenant.
    pub async fn record_rejection(&self, auth: &AuthContext, error: &ApiError, meta: &RequestMeta) {
        self.append_log(
            auth,
            RequestOutcome::Failed,
            0,
            Some(error.message.clone()),
            0,
            meta,
        )
        .await;
    }

    fn validate_pagination(&self, limit: Option<i64>, offset: Option<i64>) -> ApiResult<(i64, i64)> {
        if let Some(limit) = limit {
            if limit < 1 {
                return Err(ApiError::invalid_range("limit", 1, self.config.max_page_size));
            }
        }
        if let Some(offset) = offset {
            if offset < 0 {
                return Err(ApiError::invalid_range("offset", 0, i64::MAX));
            }
        }
        Ok((self.config.clamp_limit(limit), offset.unwrap_or(0)))
    }

    async fn progress_inner(
        &self,
        auth: &AuthContext,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ApiResult<Value> {
        let (limit, offset) = self.validate_pagination(limit, offset)?;

        let config = self
            .tenant_configs
            .get(auth.tenant_id)
            .await?
            .ok_or_else(|| ApiError::tenant_not_found(auth.tenant_id))?;

        self.limiter
            .check(&config, auth.identity_id, PROGRESS_ENDPOINT)
            .await?;

        let status = self
            .sync
            .current(auth.tenant_id, &auth.credential_hash)
            .await?;
        let mode = resolve_sync_mode(&config, status.as_ref());

        let selection = self.engine.resolve_courses(&config).await?;
        let course_ids: &[i64] = match &selection {
            CourseSelection::Enabled(ids) => ids,
            _ => &[],
        };

        let key = CacheKeyParams {
            tenant_id: auth.tenant_id,
            limit,
            offset,
            mode,
            course_ids,
            field_flags: &config.field_flags,
        }
        .derive();

        if let Some(hit) = self.cache.get(&config, &key).await? {
            return Ok(hit);
        }

        let rows = self
            .engine
            .fetch_page(&config, mode, status.as_ref(), &selection, limit, offset)
            .await?;

        let records: Vec<Value> = rows
            .iter()
            .map(|row| Value::Object(project_row(row, &config.field_flags)))
            .collect();
        let payload = json!({
            "records": records,
            "record_count": records.len(),
            "sync_mode": mode.as_str(),
            "generated_at": self.clock.now().to_rfc3339(),
        });

        self.cache.put(&config, &key, payload.clone()).await?;
        Ok(payload)
    }

    async fn append_log(
        &self,
        auth: &AuthContext,
        outcome: RequestOutcome,
        record_count: i64,
        error: Option<String>,
        latency_ms: i64,
        meta: &RequestMeta,
    ) {
        let entry = RequestLogEntry {
            entry_id: new_entity_id(),
            tenant_id: auth.tenant_id,
            identity_id: auth.identity_id,
            endpoint: PROGRESS_ENDPOINT.to_string(),
            outcome,
            record_count,
            error,
            latency_ms,
            client_ip: meta.client_ip.clone(),
            user_agent: meta.user_agent.clone(),
            created_at: self.clock.now(),
        };
        if let Err(err) = self.request_log.append(&entry).await {
            warn!(tenant_id = %auth.tenant_id, error = %err, "failed to append request log entry");
        }
    }
}

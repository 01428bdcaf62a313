//! Database Connection Pool Module
//!
//! PostgreSQL backend for every Paceline storage trait, pooled with
//! deadpool-postgres. `ensure_schema` creates the tables at startup so
//! capability is resolved once, never probed per request.

use deadpool_postgres::{Config, ManagerConfig, Pool, PoolError, RecyclingMethod, Runtime};
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

use async_trait::async_trait;
use paceline_core::{
    Alert, CompletionStatus, CourseSetting, Credential, EntityId, FieldFlags, ProgressRow,
    RequestLogEntry, StorageError, SyncOutcome, SyncStatus, TenantConfig, Timestamp,
};
use paceline_store::{
    AlertSink, CacheEntry, CredentialStore, RequestLogStore, ResponseCacheStore, SnapshotOrder,
    SnapshotQuery, SnapshotStore, SourceStore, StoreResult, SyncStatusStore, TenantConfigStore,
};

use crate::error::{ApiError, ApiResult};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "paceline".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("PACELINE_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("PACELINE_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("PACELINE_DB_NAME").unwrap_or_else(|_| "paceline".to_string()),
            user: std::env::var("PACELINE_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("PACELINE_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("PACELINE_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("PACELINE_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tenant_configs (
    tenant_id           UUID PRIMARY KEY,
    name                TEXT NOT NULL,
    daily_quota         BIGINT,
    cache_enabled       BOOLEAN NOT NULL DEFAULT TRUE,
    cache_ttl_minutes   BIGINT NOT NULL DEFAULT 30,
    course_settings     JSONB,
    field_flags         JSONB NOT NULL,
    first_sync_hours    BIGINT,
    force_full_sync     BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE IF NOT EXISTS credentials (
    credential_id   UUID PRIMARY KEY,
    token           TEXT NOT NULL UNIQUE,
    identity_id     UUID NOT NULL,
    tenant_id       UUID NOT NULL,
    valid_from      TIMESTAMPTZ NOT NULL,
    valid_until     TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS sync_status (
    tenant_id        UUID NOT NULL,
    credential_hash  TEXT NOT NULL,
    last_synced_at   TIMESTAMPTZ NOT NULL,
    outcome          TEXT NOT NULL,
    message          TEXT,
    PRIMARY KEY (tenant_id, credential_hash)
);

CREATE TABLE IF NOT EXISTS progress_snapshot (
    tenant_id        UUID NOT NULL,
    user_id          BIGINT NOT NULL,
    course_id        BIGINT NOT NULL,
    username         TEXT NOT NULL,
    email            TEXT NOT NULL,
    course_name      TEXT NOT NULL,
    status           TEXT NOT NULL,
    percent_complete DOUBLE PRECISION NOT NULL,
    time_enrolled    TIMESTAMPTZ,
    time_started     TIMESTAMPTZ,
    time_completed   TIMESTAMPTZ,
    last_updated     TIMESTAMPTZ NOT NULL,
    is_deleted       BOOLEAN NOT NULL DEFAULT FALSE,
    PRIMARY KEY (tenant_id, user_id, course_id)
);
CREATE INDEX IF NOT EXISTS idx_snapshot_updated
    ON progress_snapshot (tenant_id, last_updated DESC);

CREATE TABLE IF NOT EXISTS users (
    tenant_id  UUID NOT NULL,
    user_id    BIGINT NOT NULL,
    username   TEXT NOT NULL,
    email      TEXT NOT NULL,
    PRIMARY KEY (tenant_id, user_id)
);

CREATE TABLE IF NOT EXISTS courses (
    tenant_id   UUID NOT NULL,
    course_id   BIGINT NOT NULL,
    course_name TEXT NOT NULL,
    PRIMARY KEY (tenant_id, course_id)
);

CREATE TABLE IF NOT EXISTS enrollments (
    tenant_id        UUID NOT NULL,
    user_id          BIGINT NOT NULL,
    course_id        BIGINT NOT NULL,
    status           TEXT NOT NULL,
    percent_complete DOUBLE PRECISION NOT NULL,
    time_enrolled    TIMESTAMPTZ,
    time_started     TIMESTAMPTZ,
    time_completed   TIMESTAMPTZ,
    last_updated     TIMESTAMPTZ NOT NULL,
    is_deleted       BOOLEAN NOT NULL DEFAULT FALSE,
    PRIMARY KEY (tenant_id, user_id, course_id)
);

CREATE TABLE IF NOT EXISTS response_cache (
    key        TEXT PRIMARY KEY,
    tenant_id  UUID NOT NULL,
    payload    JSONB NOT NULL,
    expires_at TIMESTAMPTZ NOT NULL,
    hits       BIGINT NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_response_cache_tenant ON response_cache (tenant_id);

CREATE TABLE IF NOT EXISTS request_log (
    entry_id     UUID PRIMARY KEY,
    tenant_id    UUID NOT NULL,
    identity_id  UUID NOT NULL,
    endpoint     TEXT NOT NULL,
    outcome      TEXT NOT NULL,
    record_count BIGINT NOT NULL,
    error        TEXT,
    latency_ms   BIGINT NOT NULL,
    client_ip    TEXT,
    user_agent   TEXT,
    created_at   TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_request_log_identity
    ON request_log (identity_id, created_at);

CREATE TABLE IF NOT EXISTS alerts (
    id         BIGSERIAL PRIMARY KEY,
    kind       TEXT NOT NULL,
    severity   TEXT NOT NULL,
    message    TEXT NOT NULL,
    tenant_id  UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);
"#;

// ============================================================================
// DATABASE CLIENT
// ============================================================================

/// Pooled PostgreSQL client implementing every Paceline storage trait.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

fn db_err(err: tokio_postgres::Error) -> StorageError {
    StorageError::QueryFailed {
        reason: err.to_string(),
    }
}

fn pool_err(err: PoolError) -> StorageError {
    match err {
        PoolError::Timeout(_) => StorageError::PoolExhausted,
        other => StorageError::Unavailable {
            reason: other.to_string(),
        },
    }
}

const PROGRESS_COLUMNS: &str = "tenant_id, user_id, username, email, course_id, course_name, \
     status, percent_complete, time_enrolled, time_started, time_completed, \
     last_updated, is_deleted";

fn row_to_progress(row: &Row) -> StoreResult<ProgressRow> {
    let status_str: String = row.try_get("status").map_err(db_err)?;
    let status = CompletionStatus::parse(&status_str).ok_or_else(|| StorageError::QueryFailed {
        reason: format!("unknown completion status '{}'", status_str),
    })?;

    Ok(ProgressRow {
        tenant_id: row.try_get("tenant_id").map_err(db_err)?,
        user_id: row.try_get("user_id").map_err(db_err)?,
        username: row.try_get("username").map_err(db_err)?,
        email: row.try_get("email").map_err(db_err)?,
        course_id: row.try_get("course_id").map_err(db_err)?,
        course_name: row.try_get("course_name").map_err(db_err)?,
        status,
        percent_complete: row.try_get("percent_complete").map_err(db_err)?,
        time_enrolled: row.try_get("time_enrolled").map_err(db_err)?,
        time_started: row.try_get("time_started").map_err(db_err)?,
        time_completed: row.try_get("time_completed").map_err(db_err)?,
        last_updated: row.try_get("last_updated").map_err(db_err)?,
        is_deleted: row.try_get("is_deleted").map_err(db_err)?,
    })
}

fn sync_outcome_str(outcome: SyncOutcome) -> &'static str {
    match outcome {
        SyncOutcome::Success => "success",
        SyncOutcome::Failed => "failed",
    }
}

fn parse_sync_outcome(s: &str) -> StoreResult<SyncOutcome> {
    match s {
        "success" => Ok(SyncOutcome::Success),
        "failed" => Ok(SyncOutcome::Failed),
        other => Err(StorageError::QueryFailed {
            reason: format!("unknown sync outcome '{}'", other),
        }),
    }
}

impl DbClient {
    /// Create a client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        Ok(Self {
            pool: config.create_pool()?,
        })
    }

    async fn conn(&self) -> StoreResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(pool_err)
    }

    /// Create the schema if it does not exist. Run once at startup.
    pub async fn ensure_schema(&self) -> ApiResult<()> {
        let conn = self.conn().await.map_err(ApiError::from)?;
        conn.batch_execute(SCHEMA).await.map_err(|e| {
            ApiError::database_error(format!("Failed to ensure schema: {}", e))
        })?;
        Ok(())
    }

    /// Connectivity probe for readiness checks.
    pub async fn ping(&self) -> ApiResult<()> {
        let conn = self.conn().await.map_err(ApiError::from)?;
        conn.query_one("SELECT 1", &[])
            .await
            .map_err(|e| ApiError::database_error(format!("Ping failed: {}", e)))?;
        Ok(())
    }

    /// Shared WHERE/ORDER/pagination builder for the snapshot and live
    /// paths. `alias` prefixes row columns in the join query.
    fn build_filters<'a>(
        query: &'a SnapshotQuery,
        alias: &str,
        params: &mut Vec<&'a (dyn ToSql + Sync)>,
    ) -> String {
        let mut sql = String::new();

        if let Some(ids) = &query.course_ids {
            params.push(ids);
            sql.push_str(&format!(" AND {}course_id = ANY(${})", alias, params.len()));
        }
        if let Some(after) = &query.updated_after {
            params.push(after);
            sql.push_str(&format!(" AND {}last_updated > ${}", alias, params.len()));
        }
        if let Some(cutoff) = &query.completed_since {
            params.push(cutoff);
            sql.push_str(&format!(
                " AND ({a}time_completed IS NULL OR {a}time_completed >= ${n})",
                a = alias,
                n = params.len()
            ));
        }

        match query.order {
            SnapshotOrder::ByIdentity => {
                sql.push_str(&format!(" ORDER BY {a}user_id, {a}course_id", a = alias));
            }
            SnapshotOrder::ByLastUpdatedDesc => {
                sql.push_str(&format!(
                    " ORDER BY {a}last_updated DESC, {a}user_id, {a}course_id",
                    a = alias
                ));
            }
        }

        params.push(&query.limit);
        sql.push_str(&format!(" LIMIT ${}", params.len()));
        params.push(&query.offset);
        sql.push_str(&format!(" OFFSET ${}", params.len()));

        sql
    }
}

// ============================================================================
// STORAGE TRAIT IMPLEMENTATIONS
// ============================================================================

#[async_trait]
impl SnapshotStore for DbClient {
    async fn total_rows(&self, tenant_id: EntityId) -> StoreResult<i64> {
        let conn = self.conn().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) FROM progress_snapshot \
                 WHERE tenant_id = $1 AND is_deleted = FALSE",
                &[&tenant_id],
            )
            .await
            .map_err(db_err)?;
        row.try_get(0).map_err(db_err)
    }

    async fn fetch(&self, query: &SnapshotQuery) -> StoreResult<Vec<ProgressRow>> {
        let mut params: Vec<&(dyn ToSql + Sync)> = vec![&query.tenant_id];
        let mut sql = format!(
            "SELECT {} FROM progress_snapshot WHERE tenant_id = $1 AND is_deleted = FALSE",
            PROGRESS_COLUMNS
        );
        sql.push_str(&Self::build_filters(query, "", &mut params));

        let conn = self.conn().await?;
        let rows = conn.query(&sql, &params).await.map_err(db_err)?;
        rows.iter().map(row_to_progress).collect()
    }
}

#[async_trait]
impl SourceStore for DbClient {
    async fn live_progress(&self, query: &SnapshotQuery) -> StoreResult<Vec<ProgressRow>> {
        let mut params: Vec<&(dyn ToSql + Sync)> = vec![&query.tenant_id];
        let mut sql = String::from(
            "SELECT e.tenant_id, e.user_id, u.username, u.email, e.course_id, \
             c.course_name, e.status, e.percent_complete, e.time_enrolled, \
             e.time_started, e.time_completed, e.last_updated, e.is_deleted \
             FROM enrollments e \
             JOIN users u ON u.tenant_id = e.tenant_id AND u.user_id = e.user_id \
             JOIN courses c ON c.tenant_id = e.tenant_id AND c.course_id = e.course_id \
             WHERE e.tenant_id = $1 AND e.is_deleted = FALSE",
        );
        sql.push_str(&Self::build_filters(query, "e.", &mut params));

        let conn = self.conn().await?;
        let rows = conn.query(&sql, &params).await.map_err(db_err)?;
        rows.iter().map(row_to_progress).collect()
    }

    async fn course_ids_for_tenant(&self, tenant_id: EntityId) -> StoreResult<Vec<i64>> {
        let conn = self.conn().await?;
        let rows = conn
            .query(
                "SELECT course_id FROM courses WHERE tenant_id = $1 ORDER BY course_id",
                &[&tenant_id],
            )
            .await
            .map_err(db_err)?;
        rows.iter().map(|r| r.try_get(0).map_err(db_err)).collect()
    }
}

#[async_trait]
impl TenantConfigStore for DbClient {
    async fn config_get(&self, tenant_id: EntityId) -> StoreResult<Option<TenantConfig>> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "SELECT tenant_id, name, daily_quota, cache_enabled, cache_ttl_minutes, \
                 course_settings, field_flags, first_sync_hours, force_full_sync \
                 FROM tenant_configs WHERE tenant_id = $1",
                &[&tenant_id],
            )
            .await
            .map_err(db_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let course_settings: Option<serde_json::Value> =
            row.try_get("course_settings").map_err(db_err)?;
        let course_settings: Option<Vec<CourseSetting>> = match course_settings {
            Some(value) => {
                Some(
                    serde_json::from_value(value).map_err(|e| StorageError::QueryFailed {
                        reason: format!("invalid course_settings json: {}", e),
                    })?,
                )
            }
            None => None,
        };

        let field_flags: serde_json::Value = row.try_get("field_flags").map_err(db_err)?;
        let field_flags: FieldFlags =
            serde_json::from_value(field_flags).map_err(|e| StorageError::QueryFailed {
                reason: format!("invalid field_flags json: {}", e),
            })?;

        Ok(Some(TenantConfig {
            tenant_id: row.try_get("tenant_id").map_err(db_err)?,
            name: row.try_get("name").map_err(db_err)?,
            daily_quota: row.try_get("daily_quota").map_err(db_err)?,
            cache_enabled: row.try_get("cache_enabled").map_err(db_err)?,
            cache_ttl_minutes: row.try_get("cache_ttl_minutes").map_err(db_err)?,
            course_settings,
            field_flags,
            first_sync_hours: row.try_get("first_sync_hours").map_err(db_err)?,
            force_full_sync: row.try_get("force_full_sync").map_err(db_err)?,
        }))
    }

    async fn config_put(&self, config: &TenantConfig) -> StoreResult<()> {
        let course_settings = config
            .course_settings
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StorageError::InsertFailed {
                reason: format!("course_settings json: {}", e),
            })?;
        let field_flags =
            serde_json::to_value(&config.field_flags).map_err(|e| StorageError::InsertFailed {
                reason: format!("field_flags json: {}", e),
            })?;

        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO tenant_configs (tenant_id, name, daily_quota, cache_enabled, \
             cache_ttl_minutes, course_settings, field_flags, first_sync_hours, force_full_sync) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (tenant_id) DO UPDATE SET \
             name = EXCLUDED.name, daily_quota = EXCLUDED.daily_quota, \
             cache_enabled = EXCLUDED.cache_enabled, \
             cache_ttl_minutes = EXCLUDED.cache_ttl_minutes, \
             course_settings = EXCLUDED.course_settings, \
             field_flags = EXCLUDED.field_flags, \
             first_sync_hours = EXCLUDED.first_sync_hours, \
             force_full_sync = EXCLUDED.force_full_sync",
            &[
                &config.tenant_id,
                &config.name,
                &config.daily_quota,
                &config.cache_enabled,
                &config.cache_ttl_minutes,
                &course_settings,
                &field_flags,
                &config.first_sync_hours,
                &config.force_full_sync,
            ],
        )
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn set_course_settings(
        &self,
        tenant_id: EntityId,
        settings: Vec<CourseSetting>,
    ) -> StoreResult<()> {
        let value = serde_json::to_value(&settings).map_err(|e| StorageError::UpdateFailed {
            reason: format!("course_settings json: {}", e),
        })?;

        let conn = self.conn().await?;
        let updated = conn
            .execute(
                "UPDATE tenant_configs SET course_settings = $2 WHERE tenant_id = $1",
                &[&tenant_id, &value],
            )
            .await
            .map_err(db_err)?;

        if updated == 0 {
            return Err(StorageError::NotFound {
                what: "tenant_config",
                key: tenant_id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for DbClient {
    async fn resolve(&self, token: &str) -> StoreResult<Option<Credential>> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "SELECT credential_id, token, identity_id, tenant_id, valid_from, valid_until \
                 FROM credentials WHERE token = $1",
                &[&token],
            )
            .await
            .map_err(db_err)?;

        row.map(|row| {
            Ok(Credential {
                credential_id: row.try_get("credential_id").map_err(db_err)?,
                token: row.try_get("token").map_err(db_err)?,
                identity_id: row.try_get("identity_id").map_err(db_err)?,
                tenant_id: row.try_get("tenant_id").map_err(db_err)?,
                valid_from: row.try_get("valid_from").map_err(db_err)?,
                valid_until: row.try_get("valid_until").map_err(db_err)?,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl SyncStatusStore for DbClient {
    async fn status_get(
        &self,
        tenant_id: EntityId,
        credential_hash: &str,
    ) -> StoreResult<Option<SyncStatus>> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "SELECT tenant_id, credential_hash, last_synced_at, outcome, message \
                 FROM sync_status WHERE tenant_id = $1 AND credential_hash = $2",
                &[&tenant_id, &credential_hash],
            )
            .await
            .map_err(db_err)?;

        row.map(|row| {
            let outcome_str: String = row.try_get("outcome").map_err(db_err)?;
            Ok(SyncStatus {
                tenant_id: row.try_get("tenant_id").map_err(db_err)?,
                credential_hash: row.try_get("credential_hash").map_err(db_err)?,
                last_synced_at: row.try_get("last_synced_at").map_err(db_err)?,
                outcome: parse_sync_outcome(&outcome_str)?,
                message: row.try_get("message").map_err(db_err)?,
            })
        })
        .transpose()
    }

    async fn status_upsert(&self, status: &SyncStatus) -> StoreResult<()> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO sync_status (tenant_id, credential_hash, last_synced_at, outcome, message) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (tenant_id, credential_hash) DO UPDATE SET \
             last_synced_at = EXCLUDED.last_synced_at, \
             outcome = EXCLUDED.outcome, \
             message = EXCLUDED.message",
            &[
                &status.tenant_id,
                &status.credential_hash,
                &status.last_synced_at,
                &sync_outcome_str(status.outcome),
                &status.message,
            ],
        )
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl ResponseCacheStore for DbClient {
    async fn cache_get(&self, key: &str, tenant_id: EntityId) -> StoreResult<Option<CacheEntry>> {
        let conn = self.conn().await?;
        let row = conn
            .query_opt(
                "UPDATE response_cache SET hits = hits + 1 \
                 WHERE key = $1 AND tenant_id = $2 \
                 RETURNING key, tenant_id, payload, expires_at, hits",
                &[&key, &tenant_id],
            )
            .await
            .map_err(db_err)?;

        row.map(|row| {
            let hits: i64 = row.try_get("hits").map_err(db_err)?;
            Ok(CacheEntry {
                key: row.try_get("key").map_err(db_err)?,
                tenant_id: row.try_get("tenant_id").map_err(db_err)?,
                payload: row.try_get("payload").map_err(db_err)?,
                expires_at: row.try_get("expires_at").map_err(db_err)?,
                hits: hits.max(0) as u64,
            })
        })
        .transpose()
    }

    async fn cache_put(&self, entry: CacheEntry) -> StoreResult<()> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO response_cache (key, tenant_id, payload, expires_at, hits) \
             VALUES ($1, $2, $3, $4, 0) \
             ON CONFLICT (key) DO UPDATE SET \
             tenant_id = EXCLUDED.tenant_id, payload = EXCLUDED.payload, \
             expires_at = EXCLUDED.expires_at, hits = 0",
            &[&entry.key, &entry.tenant_id, &entry.payload, &entry.expires_at],
        )
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn clear_tenant(&self, tenant_id: EntityId) -> StoreResult<u64> {
        let conn = self.conn().await?;
        conn.execute("DELETE FROM response_cache WHERE tenant_id = $1", &[&tenant_id])
            .await
            .map_err(db_err)
    }

    async fn clear_all(&self) -> StoreResult<u64> {
        let conn = self.conn().await?;
        conn.execute("DELETE FROM response_cache", &[])
            .await
            .map_err(db_err)
    }

    async fn purge_expired(&self, now: Timestamp) -> StoreResult<u64> {
        let conn = self.conn().await?;
        conn.execute("DELETE FROM response_cache WHERE expires_at <= $1", &[&now])
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl RequestLogStore for DbClient {
    async fn append(&self, entry: &RequestLogEntry) -> StoreResult<()> {
        let outcome = match entry.outcome {
            paceline_core::RequestOutcome::Success => "success",
            paceline_core::RequestOutcome::Failed => "failed",
            paceline_core::RequestOutcome::RateLimited => "rate_limited",
        };

        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO request_log (entry_id, tenant_id, identity_id, endpoint, outcome, \
             record_count, error, latency_ms, client_ip, user_agent, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            &[
                &entry.entry_id,
                &entry.tenant_id,
                &entry.identity_id,
                &entry.endpoint,
                &outcome,
                &entry.record_count,
                &entry.error,
                &entry.latency_ms,
                &entry.client_ip,
                &entry.user_agent,
                &entry.created_at,
            ],
        )
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn count_for_identity_since(
        &self,
        identity_id: EntityId,
        since: Timestamp,
    ) -> StoreResult<i64> {
        let conn = self.conn().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) FROM request_log \
                 WHERE identity_id = $1 AND created_at >= $2",
                &[&identity_id, &since],
            )
            .await
            .map_err(db_err)?;
        row.try_get(0).map_err(db_err)
    }
}

#[async_trait]
impl AlertSink for DbClient {
    async fn notify(&self, alert: Alert) -> StoreResult<()> {
        let severity = match alert.severity {
            paceline_core::AlertSeverity::Info => "info",
            paceline_core::AlertSeverity::Warning => "warning",
            paceline_core::AlertSeverity::Critical => "critical",
        };

        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO alerts (kind, severity, message, tenant_id, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
            &[
                &alert.kind,
                &severity,
                &alert.message,
                &alert.tenant_id,
                &alert.created_at,
            ],
        )
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_build_filters_orders_and_paginates() {
        let query = SnapshotQuery {
            tenant_id: Uuid::now_v7(),
            course_ids: Some(vec![5, 7]),
            updated_after: Some(Utc::now()),
            completed_since: None,
            order: SnapshotOrder::ByLastUpdatedDesc,
            limit: 25,
            offset: 50,
        };

        let mut params: Vec<&(dyn ToSql + Sync)> = vec![&query.tenant_id];
        let sql = DbClient::build_filters(&query, "e.", &mut params);

        assert!(sql.contains("e.course_id = ANY($2)"));
        assert!(sql.contains("e.last_updated > $3"));
        assert!(sql.contains("ORDER BY e.last_updated DESC, e.user_id, e.course_id"));
        assert!(sql.contains("LIMIT $4"));
        assert!(sql.contains("OFFSET $5"));
        assert_eq!(params.len(), 5);
    }

    #[test]
    fn test_build_filters_identity_order_with_window() {
        let query = SnapshotQuery {
            tenant_id: Uuid::now_v7(),
            course_ids: None,
            updated_after: None,
            completed_since: Some(Utc::now()),
            order: SnapshotOrder::ByIdentity,
            limit: 100,
            offset: 0,
        };

        let mut params: Vec<&(dyn ToSql + Sync)> = vec![&query.tenant_id];
        let sql = DbClient::build_filters(&query, "", &mut params);

        assert!(sql.contains("(time_completed IS NULL OR time_completed >= $2)"));
        assert!(sql.contains("ORDER BY user_id, course_id"));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_sync_outcome_round_trip() {
        for outcome in [SyncOutcome::Success, SyncOutcome::Failed] {
            assert_eq!(
                parse_sync_outcome(sync_outcome_str(outcome)).unwrap(),
                outcome
            );
        }
        assert!(parse_sync_outcome("bogus").is_err());
    }
}

//! Storage abstraction for the Paceline persistent stores.
//!
//! Each trait covers one store from the system design: reporting snapshot,
//! live source-of-truth entities (the fallback join), tenant configuration,
//! credentials, sync status, the response cache, and the request log. The
//! in-memory backend in this crate and the PostgreSQL backend in
//! `paceline-api` both implement them.

use async_trait::async_trait;
use paceline_core::{
    Alert, CourseSetting, Credential, EntityId, ProgressRow, RequestLogEntry, StorageError,
    SyncStatus, TenantConfig, Timestamp,
};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StorageError>;

/// Row ordering for snapshot/live queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrder {
    /// `(user_id, course_id)` ascending - full and first syncs.
    ByIdentity,
    /// `last_updated` descending, then `(user_id, course_id)` - incremental.
    ByLastUpdatedDesc,
}

/// One query against the snapshot table or the live fallback join.
///
/// Both paths take the same query shape and emit the same row shape, so the
/// engine can switch between them without reshaping anything. Soft-deleted
/// rows are always excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotQuery {
    pub tenant_id: EntityId,
    /// Restrict to these course ids. `None` means no restriction.
    pub course_ids: Option<Vec<i64>>,
    /// Keep only rows with `last_updated` strictly after this instant
    /// (incremental sync cursor).
    pub updated_after: Option<Timestamp>,
    /// Drop rows whose completion timestamp is older than this cutoff
    /// (first-sync bounded look-back).
    pub completed_since: Option<Timestamp>,
    pub order: SnapshotOrder,
    pub limit: i64,
    pub offset: i64,
}

/// Precomputed per-tenant reporting snapshot (the fast path).
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Tenant-wide count of non-deleted snapshot rows, ignoring every other
    /// filter. Zero means the batch process has not populated this tenant
    /// yet and the engine must fall back to the live join.
    async fn total_rows(&self, tenant_id: EntityId) -> StoreResult<i64>;

    /// Fetch one page of snapshot rows.
    async fn fetch(&self, query: &SnapshotQuery) -> StoreResult<Vec<ProgressRow>>;
}

/// Source-of-truth entities (users, courses, enrollments, completions) used
/// by the fallback join and the course bootstrap.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Compute one page of progress rows directly from source entities,
    /// honoring the same query shape as the snapshot path.
    async fn live_progress(&self, query: &SnapshotQuery) -> StoreResult<Vec<ProgressRow>>;

    /// All course ids the tenant currently has, for the one-time
    /// auto-enable bootstrap.
    async fn course_ids_for_tenant(&self, tenant_id: EntityId) -> StoreResult<Vec<i64>>;
}

/// Tenant configuration store. Read-only from the core's perspective except
/// for the one-time course auto-enable bootstrap.
#[async_trait]
pub trait TenantConfigStore: Send + Sync {
    async fn config_get(&self, tenant_id: EntityId) -> StoreResult<Option<TenantConfig>>;

    /// Persist a full configuration record (admin tooling and fixtures).
    async fn config_put(&self, config: &TenantConfig) -> StoreResult<()>;

    /// Persist course settings for a tenant - the bootstrap write path.
    async fn set_course_settings(
        &self,
        tenant_id: EntityId,
        settings: Vec<CourseSetting>,
    ) -> StoreResult<()>;
}

/// Credential lookup. Tokens are issued externally; the core only resolves.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Resolve an opaque token to its credential, or `None` if unknown.
    async fn resolve(&self, token: &str) -> StoreResult<Option<Credential>>;
}

/// Sync status, keyed by (tenant, credential fingerprint). Written only by
/// batch sync jobs.
#[async_trait]
pub trait SyncStatusStore: Send + Sync {
    async fn status_get(
        &self,
        tenant_id: EntityId,
        credential_hash: &str,
    ) -> StoreResult<Option<SyncStatus>>;

    async fn status_upsert(&self, status: &SyncStatus) -> StoreResult<()>;
}

/// A stored response-cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub tenant_id: EntityId,
    pub payload: serde_json::Value,
    pub expires_at: Timestamp,
    pub hits: u64,
}

/// Keyed response cache with per-tenant bulk invalidation.
///
/// The store returns entries regardless of expiry; the cache service treats
/// expired entries as misses. Eager deletion is not required.
#[async_trait]
pub trait ResponseCacheStore: Send + Sync {
    /// Get an entry by key, bumping its hit counter when present.
    async fn cache_get(&self, key: &str, tenant_id: EntityId) -> StoreResult<Option<CacheEntry>>;

    /// Insert or refresh an entry.
    async fn cache_put(&self, entry: CacheEntry) -> StoreResult<()>;

    /// Delete every entry for one tenant. Returns the number removed.
    async fn clear_tenant(&self, tenant_id: EntityId) -> StoreResult<u64>;

    /// Delete every entry. Returns the number removed.
    async fn clear_all(&self) -> StoreResult<u64>;

    /// Remove entries past their expiry. Returns the number removed.
    async fn purge_expired(&self, now: Timestamp) -> StoreResult<u64>;
}

/// Append-only request log; doubles as the rate limiter's counter source.
#[async_trait]
pub trait RequestLogStore: Send + Sync {
    async fn append(&self, entry: &RequestLogEntry) -> StoreResult<()>;

    /// Count entries (all outcomes, including the boundary violation row)
    /// for one identity since the given instant.
    async fn count_for_identity_since(
        &self,
        identity_id: EntityId,
        since: Timestamp,
    ) -> StoreResult<i64>;
}

/// Destination for violation/administrative alerts. Fire-and-forget: the
/// caller logs and swallows errors.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, alert: Alert) -> StoreResult<()>;
}

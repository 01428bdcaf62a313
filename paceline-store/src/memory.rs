//! In-memory store backend.
//!
//! `MemoryStore` implements every storage trait over `Arc<RwLock<HashMap>>`
//! tables. It backs the integration tests and local development; the
//! PostgreSQL backend lives in `paceline-api`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use paceline_core::{
    Alert, CourseSetting, Credential, EntityId, ProgressRow, RequestLogEntry, StorageError,
    SyncStatus, TenantConfig, Timestamp,
};

use crate::traits::{
    AlertSink, CacheEntry, CredentialStore, RequestLogStore, ResponseCacheStore, SnapshotOrder,
    SnapshotQuery, SnapshotStore, SourceStore, StoreResult, SyncStatusStore, TenantConfigStore,
};

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| StorageError::LockPoisoned)
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| StorageError::LockPoisoned)
}

/// Apply a `SnapshotQuery`'s filters, ordering, and pagination to rows.
/// Shared by the snapshot and live-source paths so both stay in lockstep.
fn apply_query(mut rows: Vec<ProgressRow>, query: &SnapshotQuery) -> Vec<ProgressRow> {
    rows.retain(|r| {
        if r.tenant_id != query.tenant_id || r.is_deleted {
            return false;
        }
        if let Some(ids) = &query.course_ids {
            if !ids.contains(&r.course_id) {
                return false;
            }
        }
        if let Some(after) = query.updated_after {
            if r.last_updated <= after {
                return false;
            }
        }
        if let Some(cutoff) = query.completed_since {
            // The look-back window only prunes already-completed rows.
            if let Some(completed) = r.time_completed {
                if completed < cutoff {
                    return false;
                }
            }
        }
        true
    });

    match query.order {
        SnapshotOrder::ByIdentity => rows.sort_by_key(|r| r.identity_key()),
        SnapshotOrder::ByLastUpdatedDesc => {
            rows.sort_by(|a, b| {
                b.last_updated
                    .cmp(&a.last_updated)
                    .then_with(|| a.identity_key().cmp(&b.identity_key()))
            });
        }
    }

    rows.into_iter()
        .skip(query.offset.max(0) as usize)
        .take(query.limit.max(0) as usize)
        .collect()
}

/// In-memory backend implementing every Paceline storage trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Arc<RwLock<HashMap<(EntityId, i64, i64), ProgressRow>>>,
    live_rows: Arc<RwLock<HashMap<(EntityId, i64, i64), ProgressRow>>>,
    tenant_courses: Arc<RwLock<HashMap<EntityId, Vec<i64>>>>,
    configs: Arc<RwLock<HashMap<EntityId, TenantConfig>>>,
    credentials: Arc<RwLock<HashMap<String, Credential>>>,
    sync_statuses: Arc<RwLock<HashMap<(EntityId, String), SyncStatus>>>,
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
    request_log: Arc<RwLock<Vec<RequestLogEntry>>>,
    alerts: Arc<RwLock<Vec<Alert>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all tables.
    pub fn clear(&self) -> StoreResult<()> {
        write(&self.snapshot)?.clear();
        write(&self.live_rows)?.clear();
        write(&self.tenant_courses)?.clear();
        write(&self.configs)?.clear();
        write(&self.credentials)?.clear();
        write(&self.sync_statuses)?.clear();
        write(&self.cache)?.clear();
        write(&self.request_log)?.clear();
        write(&self.alerts)?.clear();
        Ok(())
    }

    // === Seeding helpers (fixtures and tests) ===

    /// Insert or replace a snapshot row.
    pub fn seed_snapshot_row(&self, row: ProgressRow) -> StoreResult<()> {
        let key = (row.tenant_id, row.user_id, row.course_id);
        write(&self.snapshot)?.insert(key, row);
        Ok(())
    }

    /// Insert or replace a live source row (fallback-path data).
    pub fn seed_live_row(&self, row: ProgressRow) -> StoreResult<()> {
        let key = (row.tenant_id, row.user_id, row.course_id);
        write(&self.live_rows)?.insert(key, row);
        Ok(())
    }

    /// Set the full course-catalog id list for a tenant.
    pub fn seed_tenant_courses(&self, tenant_id: EntityId, ids: Vec<i64>) -> StoreResult<()> {
        write(&self.tenant_courses)?.insert(tenant_id, ids);
        Ok(())
    }

    /// Insert a credential, keyed by token.
    pub fn seed_credential(&self, credential: Credential) -> StoreResult<()> {
        write(&self.credentials)?.insert(credential.token.clone(), credential);
        Ok(())
    }

    /// Insert or replace a tenant config without going through the trait.
    pub fn seed_config(&self, config: TenantConfig) -> StoreResult<()> {
        write(&self.configs)?.insert(config.tenant_id, config);
        Ok(())
    }

    /// Insert or replace a sync status for (tenant, credential fingerprint).
    pub fn seed_sync_status(&self, status: SyncStatus) -> StoreResult<()> {
        let key = (status.tenant_id, status.credential_hash.clone());
        write(&self.sync_statuses)?.insert(key, status);
        Ok(())
    }

    // === Inspection helpers ===

    /// Count of snapshot rows, including soft-deleted ones.
    pub fn snapshot_count(&self) -> StoreResult<usize> {
        Ok(read(&self.snapshot)?.len())
    }

    /// Count of cached responses, including expired ones.
    pub fn cache_entry_count(&self) -> StoreResult<usize> {
        Ok(read(&self.cache)?.len())
    }

    /// All request log entries, in append order.
    pub fn log_entries(&self) -> StoreResult<Vec<RequestLogEntry>> {
        Ok(read(&self.request_log)?.clone())
    }

    /// All alerts handed to the sink, in emit order.
    pub fn emitted_alerts(&self) -> StoreResult<Vec<Alert>> {
        Ok(read(&self.alerts)?.clone())
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            snapshot: Arc::clone(&self.snapshot),
            live_rows: Arc::clone(&self.live_rows),
            tenant_courses: Arc::clone(&self.tenant_courses),
            configs: Arc::clone(&self.configs),
            credentials: Arc::clone(&self.credentials),
            sync_statuses: Arc::clone(&self.sync_statuses),
            cache: Arc::clone(&self.cache),
            request_log: Arc::clone(&self.request_log),
            alerts: Arc::clone(&self.alerts),
        }
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn total_rows(&self, tenant_id: EntityId) -> StoreResult<i64> {
        let snapshot = read(&self.snapshot)?;
        Ok(snapshot
            .values()
            .filter(|r| r.tenant_id == tenant_id && !r.is_deleted)
            .count() as i64)
    }

    async fn fetch(&self, query: &SnapshotQuery) -> StoreResult<Vec<ProgressRow>> {
        let rows: Vec<ProgressRow> = read(&self.snapshot)?.values().cloned().collect();
        Ok(apply_query(rows, query))
    }
}

#[async_trait]
impl SourceStore for MemoryStore {
    async fn live_progress(&self, query: &SnapshotQuery) -> StoreResult<Vec<ProgressRow>> {
        let rows: Vec<ProgressRow> = read(&self.live_rows)?.values().cloned().collect();
        Ok(apply_query(rows, query))
    }

    async fn course_ids_for_tenant(&self, tenant_id: EntityId) -> StoreResult<Vec<i64>> {
        let courses = read(&self.tenant_courses)?;
        let mut ids = courses.get(&tenant_id).cloned().unwrap_or_default();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}

#[async_trait]
impl TenantConfigStore for MemoryStore {
    async fn config_get(&self, tenant_id: EntityId) -> StoreResult<Option<TenantConfig>> {
        Ok(read(&self.configs)?.get(&tenant_id).cloned())
    }

    async fn config_put(&self, config: &TenantConfig) -> StoreResult<()> {
        write(&self.configs)?.insert(config.tenant_id, config.clone());
        Ok(())
    }

    async fn set_course_settings(
        &self,
        tenant_id: EntityId,
        settings: Vec<CourseSetting>,
    ) -> StoreResult<()> {
        let mut configs = write(&self.configs)?;
        let config = configs.get_mut(&tenant_id).ok_or(StorageError::NotFound {
            what: "tenant_config",
            key: tenant_id.to_string(),
        })?;
        config.course_settings = Some(settings);
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn resolve(&self, token: &str) -> StoreResult<Option<Credential>> {
        Ok(read(&self.credentials)?.get(token).cloned())
    }
}

#[async_trait]
impl SyncStatusStore for MemoryStore {
    async fn status_get(
        &self,
        tenant_id: EntityId,
        credential_hash: &str,
    ) -> StoreResult<Option<SyncStatus>> {
        let statuses = read(&self.sync_statuses)?;
        Ok(statuses
            .get(&(tenant_id, credential_hash.to_string()))
            .cloned())
    }

    async fn status_upsert(&self, status: &SyncStatus) -> StoreResult<()> {
        let key = (status.tenant_id, status.credential_hash.clone());
        write(&self.sync_statuses)?.insert(key, status.clone());
        Ok(())
    }
}

#[async_trait]
impl ResponseCacheStore for MemoryStore {
    async fn cache_get(&self, key: &str, tenant_id: EntityId) -> StoreResult<Option<CacheEntry>> {
        let mut cache = write(&self.cache)?;
        match cache.get_mut(key) {
            Some(entry) if entry.tenant_id == tenant_id => {
                entry.hits += 1;
                Ok(Some(entry.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn cache_put(&self, entry: CacheEntry) -> StoreResult<()> {
        write(&self.cache)?.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn clear_tenant(&self, tenant_id: EntityId) -> StoreResult<u64> {
        let mut cache = write(&self.cache)?;
        let before = cache.len();
        cache.retain(|_, entry| entry.tenant_id != tenant_id);
        Ok((before - cache.len()) as u64)
    }

    async fn clear_all(&self) -> StoreResult<u64> {
        let mut cache = write(&self.cache)?;
        let removed = cache.len() as u64;
        cache.clear();
        Ok(removed)
    }

    async fn purge_expired(&self, now: Timestamp) -> StoreResult<u64> {
        let mut cache = write(&self.cache)?;
        let before = cache.len();
        cache.retain(|_, entry| entry.expires_at > now);
        Ok((before - cache.len()) as u64)
    }
}

#[async_trait]
impl RequestLogStore for MemoryStore {
    async fn append(&self, entry: &RequestLogEntry) -> StoreResult<()> {
        write(&self.request_log)?.push(entry.clone());
        Ok(())
    }

    async fn count_for_identity_since(
        &self,
        identity_id: EntityId,
        since: Timestamp,
    ) -> StoreResult<i64> {
        let log = read(&self.request_log)?;
        Ok(log
            .iter()
            .filter(|e| e.identity_id == identity_id && e.created_at >= since)
            .count() as i64)
    }
}

#[async_trait]
impl AlertSink for MemoryStore {
    async fn notify(&self, alert: Alert) -> StoreResult<()> {
        write(&self.alerts)?.push(alert);
        Ok(())
    }
}

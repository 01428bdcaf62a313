//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use paceline_store::{
    AlertSink, CredentialStore, MemoryStore, RequestLogStore, ResponseCacheStore, SnapshotStore,
    SourceStore, SyncStatusStore, TenantConfigStore,
};

use crate::auth::Clock;
use crate::config::ApiConfig;
use crate::db::DbClient;
use crate::services::{
    QueryEngine, RateLimiter, ReportService, ResponseCache, SyncService, TenantConfigCache,
};

/// One handle per storage concern. Backed by `DbClient` in production and
/// `MemoryStore` in tests; a single backend may serve every slot.
#[derive(Clone)]
pub struct Stores {
    pub snapshot: Arc<dyn SnapshotStore>,
    pub source: Arc<dyn SourceStore>,
    pub tenant_configs: Arc<dyn TenantConfigStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub sync_status: Arc<dyn SyncStatusStore>,
    pub response_cache: Arc<dyn ResponseCacheStore>,
    pub request_log: Arc<dyn RequestLogStore>,
    pub alerts: Arc<dyn AlertSink>,
}

impl Stores {
    /// All slots served by one in-memory backend.
    pub fn memory(store: MemoryStore) -> Self {
        Self {
            snapshot: Arc::new(store.clone()),
            source: Arc::new(store.clone()),
            tenant_configs: Arc::new(store.clone()),
            credentials: Arc::new(store.clone()),
            sync_status: Arc::new(store.clone()),
            response_cache: Arc::new(store.clone()),
            request_log: Arc::new(store.clone()),
            alerts: Arc::new(store),
        }
    }

    /// All slots served by the PostgreSQL client.
    pub fn postgres(db: DbClient) -> Self {
        Self {
            snapshot: Arc::new(db.clone()),
            source: Arc::new(db.clone()),
            tenant_configs: Arc::new(db.clone()),
            credentials: Arc::new(db.clone()),
            sync_status: Arc::new(db.clone()),
            response_cache: Arc::new(db.clone()),
            request_log: Arc::new(db.clone()),
            alerts: Arc::new(db),
        }
    }
}

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub config: ApiConfig,
    pub clock: Arc<dyn Clock>,
    pub tenant_configs: Arc<TenantConfigCache>,
    pub report: Arc<ReportService>,
    pub sync: Arc<SyncService>,
    pub cache: Arc<ResponseCache>,
    pub start_time: Instant,
}

impl AppState {
    /// Wire the full service graph over the given stores.
    pub fn new(stores: Stores, config: ApiConfig, clock: Arc<dyn Clock>) -> Self {
        let tenant_configs = Arc::new(TenantConfigCache::new(Arc::clone(&stores.tenant_configs)));

        let limiter = Arc::new(RateLimiter::new(
            Arc::clone(&stores.request_log),
            Arc::clone(&stores.alerts),
            Arc::clone(&clock),
            config.default_daily_quota,
        ));
        let sync = Arc::new(SyncService::new(Arc::clone(&stores.sync_status)));
        let engine = Arc::new(QueryEngine::new(
            Arc::clone(&stores.snapshot),
            Arc::clone(&stores.source),
            Arc::clone(&stores.tenant_configs),
            Arc::clone(&tenant_configs),
            Arc::clone(&clock),
        ));
        let cache = Arc::new(ResponseCache::new(
            Arc::clone(&stores.response_cache),
            Arc::clone(&clock),
            config.default_cache_ttl_minutes,
        ));
        let report = Arc::new(ReportService::new(
            Arc::clone(&tenant_configs),
            limiter,
            Arc::clone(&sync),
            engine,
            Arc::clone(&cache),
            Arc::clone(&stores.request_log),
            Arc::clone(&clock),
            config.clone(),
        ));

        Self {
            stores,
            config,
            clock,
            tenant_configs,
            report,
            sync,
            cache,
            start_time: Instant::now(),
        }
    }
}

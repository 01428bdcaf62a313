//! Memoized tenant-configuration access.
//!
//! A read-through cache over `TenantConfigStore` with explicit invalidation.
//! Configuration is read on every request; memoizing it keeps the hot path
//! off the store while writes (admin changes, the course bootstrap) call
//! `invalidate` to drop the stale entry.

use std::sync::Arc;

use dashmap::DashMap;
use paceline_core::{EntityId, TenantConfig};
use paceline_store::TenantConfigStore;

use crate::error::ApiResult;

/// Read-through tenant-config cache keyed by tenant id.
pub struct TenantConfigCache {
    store: Arc<dyn TenantConfigStore>,
    entries: DashMap<EntityId, TenantConfig>,
}

impl TenantConfigCache {
    pub fn new(store: Arc<dyn TenantConfigStore>) -> Self {
        Self {
            store,
            entries: DashMap::new(),
        }
    }

    /// Get a tenant's config, reading through to the store on a miss.
    /// Absent tenants are not negatively cached.
    pub async fn get(&self, tenant_id: EntityId) -> ApiResult<Option<TenantConfig>> {
        if let Some(entry) = self.entries.get(&tenant_id) {
            return Ok(Some(entry.clone()));
        }

        let config = self.store.config_get(tenant_id).await?;
        if let Some(config) = &config {
            self.entries.insert(tenant_id, config.clone());
        }
        Ok(config)
    }

    /// Drop the memoized entry for one tenant.
    pub fn invalidate(&self, tenant_id: EntityId) {
        self.entries.remove(&tenant_id);
    }

    /// Drop every memoized entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

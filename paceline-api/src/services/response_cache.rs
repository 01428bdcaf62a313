//! Keyed response cache.
//!
//! Stores fully rendered response payloads verbatim, so a cache hit is
//! byte-identical to the response that populated it (including its
//! `generated_at`). Tenants with `cache_enabled = false` bypass the store
//! entirely in both directions. TTL minutes become an absolute `expires_at`
//! at write time; entries past expiry read as misses, with `purge_expired`
//! available for periodic cleanup.

use std::sync::Arc;

use chrono::Duration;
use paceline_core::{EntityId, TenantConfig};
use paceline_store::{CacheEntry, ResponseCacheStore};

use crate::auth::Clock;
use crate::error::ApiResult;

/// Response cache service over a `ResponseCacheStore`.
pub struct ResponseCache {
    store: Arc<dyn ResponseCacheStore>,
    clock: Arc<dyn Clock>,
    default_ttl_minutes: i64,
}

impl ResponseCache {
    pub fn new(
        store: Arc<dyn ResponseCacheStore>,
        clock: Arc<dyn Clock>,
        default_ttl_minutes: i64,
    ) -> Self {
        Self {
            store,
            clock,
            default_ttl_minutes,
        }
    }

    /// Look up a cached payload. Always a miss when the tenant has caching
    /// disabled or the entry has expired.
    pub async fn get(
        &self,
        config: &TenantConfig,
        key: &str,
    ) -> ApiResult<Option<serde_json::Value>> {
        if !config.cache_enabled {
            return Ok(None);
        }

        match self.store.cache_get(key, config.tenant_id).await? {
            Some(entry) if entry.expires_at > self.clock.now() => Ok(Some(entry.payload)),
            _ => Ok(None),
        }
    }

    /// Store a payload under the key. No-op when the tenant has caching
    /// disabled.
    pub async fn put(
        &self,
        config: &TenantConfig,
        key: &str,
        payload: serde_json::Value,
    ) -> ApiResult<()> {
        if !config.cache_enabled {
            return Ok(());
        }

        let ttl_minutes = if config.cache_ttl_minutes > 0 {
            config.cache_ttl_minutes
        } else {
            self.default_ttl_minutes
        };

        let entry = CacheEntry {
            key: key.to_string(),
            tenant_id: config.tenant_id,
            payload,
            expires_at: self.clock.now() + Duration::minutes(ttl_minutes),
            hits: 0,
        };
        self.store.cache_put(entry).await?;
        Ok(())
    }

    /// Delete every entry for one tenant. Returns the number removed.
    pub async fn clear_tenant(&self, tenant_id: EntityId) -> ApiResult<u64> {
        Ok(self.store.clear_tenant(tenant_id).await?)
    }

    /// Delete every entry. Returns the number removed.
    pub async fn clear_all(&self) -> ApiResult<u64> {
        Ok(self.store.clear_all().await?)
    }

    /// Remove expired entries. Returns the number removed.
    pub async fn purge_expired(&self) -> ApiResult<u64> {
        Ok(self.store.purge_expired(self.clock.now()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::FixedClock;
    use chrono::Utc;
    use paceline_store::MemoryStore;
    use paceline_test_utils::{new_entity_id, tenant_config};
    use serde_json::json;

    fn cache_at(store: &MemoryStore, now: paceline_core::Timestamp) -> ResponseCache {
        ResponseCache::new(Arc::new(store.clone()), Arc::new(FixedClock(now)), 30)
    }

    #[tokio::test]
    async fn test_round_trip_is_verbatim() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let config = tenant_config(new_entity_id());
        let cache = cache_at(&store, now);

        let payload = json!({
            "records": [{"user_id": 1}],
            "record_count": 1,
            "sync_mode": "full",
            "generated_at": "2026-08-29T12:00:00Z",
        });
        cache.put(&config, "k", payload.clone()).await.unwrap();

        let hit = cache.get(&config, "k").await.unwrap().unwrap();
        assert_eq!(hit, payload);
    }

    #[tokio::test]
    async fn test_disabled_tenant_never_reads_or_writes() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut config = tenant_config(new_entity_id());
        config.cache_enabled = false;
        let cache = cache_at(&store, now);

        cache.put(&config, "k", json!({"a": 1})).await.unwrap();
        assert_eq!(store.cache_entry_count().unwrap(), 0);
        assert!(cache.get(&config, "k").await.unwrap().is_none());

        // Re-enabling the flag restores normal behavior for new writes.
        config.cache_enabled = true;
        cache.put(&config, "k", json!({"a": 1})).await.unwrap();
        assert!(cache.get(&config, "k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_miss() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut config = tenant_config(new_entity_id());
        config.cache_ttl_minutes = 10;

        let cache = cache_at(&store, now);
        cache.put(&config, "k", json!({"a": 1})).await.unwrap();

        let later = ResponseCache::new(
            Arc::new(store.clone()),
            Arc::new(FixedClock(now + Duration::minutes(11))),
            30,
        );
        assert!(later.get(&config, "k").await.unwrap().is_none());

        // The stale row is still in the store until purged.
        assert_eq!(store.cache_entry_count().unwrap(), 1);
        assert_eq!(later.purge_expired().await.unwrap(), 1);
    }
}

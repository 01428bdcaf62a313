//! Report query engine.
//!
//! The primary path reads the per-tenant reporting snapshot. When the
//! tenant-wide non-deleted snapshot count is zero (the batch ETL has not run
//! for this tenant yet), the engine falls back to a live join over source
//! entities with full-mode semantics; the switch is logged at `debug!` and
//! is invisible to clients apart from ordering.
//!
//! Course handling: a tenant that has never been configured gets a one-time
//! bootstrap enabling every course it currently has, persisted through the
//! config store with the memoized config entry invalidated. A configured
//! tenant with no enabled courses gets an empty report without any query.

use std::sync::Arc;

use chrono::Duration;
use paceline_core::{
    CourseSelection, CourseSetting, ProgressRow, SyncMode, SyncStatus, TenantConfig,
};
use paceline_store::{SnapshotOrder, SnapshotQuery, SnapshotStore, SourceStore, TenantConfigStore};
use tracing::debug;

use crate::auth::Clock;
use crate::error::ApiResult;
use crate::services::tenant_cache::TenantConfigCache;

/// Snapshot-or-fallback query engine.
pub struct QueryEngine {
    snapshot: Arc<dyn SnapshotStore>,
    source: Arc<dyn SourceStore>,
    configs: Arc<dyn TenantConfigStore>,
    config_cache: Arc<TenantConfigCache>,
    clock: Arc<dyn Clock>,
}

impl QueryEngine {
    pub fn new(
        snapshot: Arc<dyn SnapshotStore>,
        source: Arc<dyn SourceStore>,
        configs: Arc<dyn TenantConfigStore>,
        config_cache: Arc<TenantConfigCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            snapshot,
            source,
            configs,
            config_cache,
            clock,
        }
    }

    /// Resolve the tenant's enabled course set, running the one-time
    /// auto-enable bootstrap for never-configured tenants.
    pub async fn resolve_courses(&self, config: &TenantConfig) -> ApiResult<CourseSelection> {
        match config.course_selection() {
            CourseSelection::Unconfigured => {
                let ids = self.source.course_ids_for_tenant(config.tenant_id).await?;
                let settings: Vec<CourseSetting> = ids
                    .iter()
                    .map(|&course_id| CourseSetting {
                        course_id,
                        enabled: true,
                    })
                    .collect();

                self.configs
                    .set_course_settings(config.tenant_id, settings)
                    .await?;
                self.config_cache.invalidate(config.tenant_id);
                debug!(tenant_id = %config.tenant_id, courses = ids.len(),
                       "bootstrapped course settings");

                if ids.is_empty() {
                    Ok(CourseSelection::NoneEnabled)
                } else {
                    Ok(CourseSelection::Enabled(ids))
                }
            }
            resolved => Ok(resolved),
        }
    }

    /// Fetch one page of progress rows for the classified request.
    pub async fn fetch_page(
        &self,
        config: &TenantConfig,
        mode: SyncMode,
        status: Option<&SyncStatus>,
        selection: &CourseSelection,
        limit: i64,
        offset: i64,
    ) -> ApiResult<Vec<ProgressRow>> {
        let course_ids = match selection {
            CourseSelection::Enabled(ids) => ids.clone(),
            // No enabled courses: empty report, no query.
            _ => return Ok(Vec::new()),
        };

        let completed_since = match (mode, config.first_sync_hours) {
            (SyncMode::First, Some(hours)) if hours > 0 => {
                Some(self.clock.now() - Duration::hours(hours))
            }
            _ => None,
        };

        let mut query = SnapshotQuery {
            tenant_id: config.tenant_id,
            course_ids: Some(course_ids),
            updated_after: None,
            completed_since,
            order: SnapshotOrder::ByIdentity,
            limit,
            offset,
        };

        let total = self.snapshot.total_rows(config.tenant_id).await?;
        if total == 0 {
            // Live-join fallback runs with full-mode semantics: no
            // incremental cursor, identity ordering, same course
            // restriction, window, and pagination.
            debug!(tenant_id = %config.tenant_id, "snapshot empty, using live fallback");
            return Ok(self.source.live_progress(&query).await?);
        }

        if mode == SyncMode::Incremental {
            query.updated_after = status.map(|s| s.last_synced_at);
            query.order = SnapshotOrder::ByLastUpdatedDesc;
        }

        Ok(self.snapshot.fetch(&query).await?)
    }
}

//! Sync-status reads and the batch-job writer.
//!
//! Report reads only ever read sync status; the single write path is
//! `record`, reached through the admin surface by batch sync jobs after a
//! snapshot run finishes.

use std::sync::Arc;

use paceline_core::{EntityId, SyncOutcome, SyncStatus, Timestamp};
use paceline_store::SyncStatusStore;

use crate::error::ApiResult;

/// Sync-status service over a `SyncStatusStore`.
pub struct SyncService {
    store: Arc<dyn SyncStatusStore>,
}

impl SyncService {
    pub fn new(store: Arc<dyn SyncStatusStore>) -> Self {
        Self { store }
    }

    /// Current status for a (tenant, credential fingerprint) pair.
    pub async fn current(
        &self,
        tenant_id: EntityId,
        credential_hash: &str,
    ) -> ApiResult<Option<SyncStatus>> {
        Ok(self.store.status_get(tenant_id, credential_hash).await?)
    }

    /// Upsert the status after a batch sync run.
    pub async fn record(
        &self,
        tenant_id: EntityId,
        credential_hash: String,
        last_synced_at: Timestamp,
        outcome: SyncOutcome,
        message: Option<String>,
    ) -> ApiResult<SyncStatus> {
        let status = SyncStatus {
            tenant_id,
            credential_hash,
            last_synced_at,
            outcome,
            message,
        };
        self.store.status_upsert(&status).await?;
        Ok(status)
    }
}

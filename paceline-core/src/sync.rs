//! Sync-mode classification
//!
//! Every request is classified as `first`, `incremental`, or `full` from the
//! tenant's configuration and the (tenant, credential) sync status. The
//! classification is a pure read - it never mutates sync status. Only batch
//! sync jobs write sync status, via the sync-status writer in the API crate.

use crate::identity::{EntityId, Timestamp};
use crate::tenant::TenantConfig;
use serde::{Deserialize, Serialize};

/// Request classification driving filtering, ordering, and the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// No sync status exists yet for this (tenant, credential).
    First,
    /// A prior successful sync exists; only newer rows are returned.
    Incremental,
    /// Explicitly configured, or the fallback when incremental processing
    /// cannot proceed.
    Full,
}

impl SyncMode {
    /// Wire representation, used in responses and cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            SyncMode::First => "first",
            SyncMode::Incremental => "incremental",
            SyncMode::Full => "full",
        }
    }
}

/// Outcome of the most recent batch sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Success,
    Failed,
}

/// Last-sync metadata for one (tenant, credential) pair.
///
/// Created on the first successful batch sync; updated only by background
/// sync jobs, never by API reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub tenant_id: EntityId,
    /// SHA-256 hex fingerprint of the credential token.
    pub credential_hash: String,
    pub last_synced_at: Timestamp,
    pub outcome: SyncOutcome,
    pub message: Option<String>,
}

/// Classify a request. Pure: no side effects, no store access.
pub fn resolve_sync_mode(config: &TenantConfig, status: Option<&SyncStatus>) -> SyncMode {
    if config.force_full_sync {
        return SyncMode::Full;
    }
    match status {
        None => SyncMode::First,
        Some(s) if s.outcome == SyncOutcome::Success => SyncMode::Incremental,
        // A failed last sync means the incremental cursor is unusable.
        Some(_) => SyncMode::Full,
    }
}

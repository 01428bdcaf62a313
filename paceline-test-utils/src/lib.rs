//! Paceline Test Utilities
//!
//! Centralized test infrastructure for the Paceline workspace:
//! - Fixtures for tenants, credentials, and progress rows
//! - A pre-seeded `MemoryStore` for end-to-end report tests
//! - Proptest generators for domain types

// Re-export the in-memory backend from its source crate
pub use paceline_store::MemoryStore;

// Re-export core types for convenience
pub use paceline_core::{
    credential_fingerprint, new_entity_id, Alert, CompletionStatus, CourseSetting,
    CourseSelection, Credential, EntityId, FieldFlags, PacelineError, PacelineResult,
    ProgressRow, ReportField, RequestLogEntry, RequestOutcome, StorageError, SyncMode,
    SyncOutcome, SyncStatus, TenantConfig, Timestamp,
};

use chrono::{Duration, Utc};
use paceline_store::CacheEntry;
use proptest::prelude::*;

// ============================================================================
// FIXTURES
// ============================================================================

/// A tenant config with caching on, no quota override, and no course
/// settings (bootstrap pending).
pub fn tenant_config(tenant_id: EntityId) -> TenantConfig {
    TenantConfig::new(tenant_id, "Test Tenant")
}

/// A tenant config whose listed courses are all enabled.
pub fn tenant_config_with_courses(tenant_id: EntityId, course_ids: &[i64]) -> TenantConfig {
    let mut config = tenant_config(tenant_id);
    config.course_settings = Some(
        course_ids
            .iter()
            .map(|&course_id| CourseSetting {
                course_id,
                enabled: true,
            })
            .collect(),
    );
    config
}

/// A credential valid for the last hour through the next 30 days.
pub fn credential_for(tenant_id: EntityId, token: impl Into<String>) -> Credential {
    let now = Utc::now();
    Credential {
        credential_id: new_entity_id(),
        token: token.into(),
        identity_id: new_entity_id(),
        tenant_id,
        valid_from: now - Duration::hours(1),
        valid_until: now + Duration::days(30),
    }
}

/// An expired credential, for auth-failure tests.
pub fn expired_credential_for(tenant_id: EntityId, token: impl Into<String>) -> Credential {
    let mut credential = credential_for(tenant_id, token);
    credential.valid_from = Utc::now() - Duration::days(30);
    credential.valid_until = Utc::now() - Duration::days(1);
    credential
}

/// One in-progress (user, course) row with deterministic identity fields.
pub fn progress_row(tenant_id: EntityId, user_id: i64, course_id: i64) -> ProgressRow {
    let now = Utc::now();
    ProgressRow {
        tenant_id,
        user_id,
        username: format!("user{}", user_id),
        email: format!("user{}@example.com", user_id),
        course_id,
        course_name: format!("Course {}", course_id),
        status: CompletionStatus::InProgress,
        percent_complete: 42.0,
        time_enrolled: Some(now - Duration::days(14)),
        time_started: Some(now - Duration::days(13)),
        time_completed: None,
        last_updated: now - Duration::hours(2),
        is_deleted: false,
    }
}

/// A completed variant of [`progress_row`].
pub fn completed_row(
    tenant_id: EntityId,
    user_id: i64,
    course_id: i64,
    completed_at: Timestamp,
) -> ProgressRow {
    let mut row = progress_row(tenant_id, user_id, course_id);
    row.status = CompletionStatus::Completed;
    row.percent_complete = 100.0;
    row.time_completed = Some(completed_at);
    row.last_updated = completed_at;
    row
}

/// A successful sync status for (tenant, credential).
pub fn sync_success(tenant_id: EntityId, credential: &Credential, at: Timestamp) -> SyncStatus {
    SyncStatus {
        tenant_id,
        credential_hash: credential.fingerprint(),
        last_synced_at: at,
        outcome: SyncOutcome::Success,
        message: None,
    }
}

/// A cache entry expiring 30 minutes from now.
pub fn cache_entry(tenant_id: EntityId, key: impl Into<String>) -> CacheEntry {
    CacheEntry {
        key: key.into(),
        tenant_id,
        payload: serde_json::json!({ "records": [], "record_count": 0 }),
        expires_at: Utc::now() + Duration::minutes(30),
        hits: 0,
    }
}

/// A seeded tenant: store, config, and one valid credential.
pub struct SeededTenant {
    pub store: MemoryStore,
    pub config: TenantConfig,
    pub credential: Credential,
}

/// Build a `MemoryStore` with one configured tenant, a valid credential,
/// and snapshot rows for the given (user, course) pairs. Course settings
/// enable every seeded course.
pub fn seeded_tenant(pairs: &[(i64, i64)]) -> PacelineResult<SeededTenant> {
    let store = MemoryStore::new();
    let tenant_id = new_entity_id();

    let mut course_ids: Vec<i64> = pairs.iter().map(|&(_, c)| c).collect();
    course_ids.sort_unstable();
    course_ids.dedup();

    let config = tenant_config_with_courses(tenant_id, &course_ids);
    let credential = credential_for(tenant_id, format!("tok_{}", tenant_id.simple()));

    store.seed_credential(credential.clone())?;
    store.seed_tenant_courses(tenant_id, course_ids)?;
    for &(user_id, course_id) in pairs {
        store.seed_snapshot_row(progress_row(tenant_id, user_id, course_id))?;
    }

    store.seed_config(config.clone())?;

    Ok(SeededTenant {
        store,
        config,
        credential,
    })
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

/// Generator for completion statuses.
pub fn arb_completion_status() -> impl Strategy<Value = CompletionStatus> {
    prop_oneof![
        Just(CompletionStatus::NotStarted),
        Just(CompletionStatus::InProgress),
        Just(CompletionStatus::Completed),
    ]
}

/// Generator for small course-id sets (possibly empty, possibly duplicated).
pub fn arb_course_ids() -> impl Strategy<Value = Vec<i64>> {
    proptest::collection::vec(1i64..1000, 0..8)
}

/// Generator for field flags built from a random subset of all fields.
pub fn arb_field_flags() -> impl Strategy<Value = FieldFlags> {
    proptest::collection::vec(proptest::bool::ANY, ReportField::all().len()).prop_map(|bits| {
        FieldFlags::from_enabled(
            ReportField::all()
                .iter()
                .zip(bits)
                .filter_map(|(&field, on)| on.then_some(field)),
        )
    })
}

//! Cache key derivation
//!
//! The response cache key is the ordered concatenation of tenant id,
//! pagination, sync mode, and two configuration fingerprints (enabled course
//! set, enabled field set). The fingerprints hash *sorted* sets, so
//! configuration order never affects the key, and any change to a tenant's
//! enabled courses or visible fields produces a different key. This is the
//! sole mechanism preventing cross-configuration cache pollution.

use crate::fields::FieldFlags;
use crate::identity::EntityId;
use crate::sync::SyncMode;
use sha2::{Digest, Sha256};

/// Sentinel fingerprint for "no courses enabled/configured".
pub const COURSE_FP_NONE: &str = "none";

/// Fingerprint of an enabled-course-id set. Sorts and dedups before hashing;
/// an empty set yields the sentinel rather than a hash.
pub fn course_fingerprint(course_ids: &[i64]) -> String {
    if course_ids.is_empty() {
        return COURSE_FP_NONE.to_string();
    }
    let mut sorted = course_ids.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut hasher = Sha256::new();
    for id in &sorted {
        hasher.update(id.to_be_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Fingerprint of the enabled field set (sorted wire names).
pub fn field_fingerprint(flags: &FieldFlags) -> String {
    let mut hasher = Sha256::new();
    for name in flags.enabled_names_sorted() {
        hasher.update(name.as_bytes());
        // Separator guards against boundary ambiguity between names.
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// The inputs to cache key derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeyParams<'a> {
    pub tenant_id: EntityId,
    pub limit: i64,
    pub offset: i64,
    pub mode: SyncMode,
    pub course_ids: &'a [i64],
    pub field_flags: &'a FieldFlags,
}

impl CacheKeyParams<'_> {
    /// Derive the deterministic cache key for these parameters.
    pub fn derive(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}",
            self.tenant_id,
            self.limit,
            self.offset,
            self.mode.as_str(),
            course_fingerprint(self.course_ids),
            field_fingerprint(self.field_flags),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::ReportField;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn params<'a>(
        tenant_id: EntityId,
        courses: &'a [i64],
        flags: &'a FieldFlags,
    ) -> CacheKeyParams<'a> {
        CacheKeyParams {
            tenant_id,
            limit: 50,
            offset: 0,
            mode: SyncMode::Full,
            course_ids: courses,
            field_flags: flags,
        }
    }

    #[test]
    fn test_course_order_does_not_affect_key() {
        // Scenario: courses [7,5] and [5,7] must produce the same key.
        let tenant = Uuid::now_v7();
        let flags = FieldFlags::from_enabled([ReportField::UserId, ReportField::Status]);
        let a = params(tenant, &[7, 5], &flags).derive();
        let b = params(tenant, &[5, 7], &flags).derive();
        assert_eq!(a, b);
    }

    #[test]
    fn test_course_change_changes_key() {
        let tenant = Uuid::now_v7();
        let flags = FieldFlags::default();
        let a = params(tenant, &[5, 7], &flags).derive();
        let b = params(tenant, &[5, 7, 9], &flags).derive();
        assert_ne!(a, b);
    }

    #[test]
    fn test_field_change_changes_key() {
        let tenant = Uuid::now_v7();
        let a_flags = FieldFlags::from_enabled([ReportField::UserId]);
        let b_flags = FieldFlags::from_enabled([ReportField::UserId, ReportField::Email]);
        let a = params(tenant, &[5], &a_flags).derive();
        let b = params(tenant, &[5], &b_flags).derive();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_courses_use_sentinel() {
        assert_eq!(course_fingerprint(&[]), COURSE_FP_NONE);
        let tenant = Uuid::now_v7();
        let flags = FieldFlags::default();
        let key = params(tenant, &[], &flags).derive();
        assert!(key.contains(":none:"));
    }

    #[test]
    fn test_mode_and_pagination_are_part_of_key() {
        let tenant = Uuid::now_v7();
        let flags = FieldFlags::default();
        let base = params(tenant, &[5], &flags);

        let mut incr = base.clone();
        incr.mode = SyncMode::Incremental;
        assert_ne!(base.derive(), incr.derive());

        let mut paged = base.clone();
        paged.offset = 50;
        assert_ne!(base.derive(), paged.derive());
    }

    proptest! {
        /// Differing enabled-course or enabled-field sets never collide, even
        /// with identical tenant, limit, offset, and sync mode.
        #[test]
        fn prop_distinct_configurations_never_collide(
            courses_a in proptest::collection::btree_set(1i64..200, 0..12),
            courses_b in proptest::collection::btree_set(1i64..200, 0..12),
            fields_a in proptest::collection::btree_set(0usize..15, 0..15),
            fields_b in proptest::collection::btree_set(0usize..15, 0..15),
        ) {
            let all = ReportField::all();
            let flags_a = FieldFlags::from_enabled(fields_a.iter().map(|i| all[*i]));
            let flags_b = FieldFlags::from_enabled(fields_b.iter().map(|i| all[*i]));
            let ids_a: Vec<i64> = courses_a.iter().copied().collect();
            let ids_b: Vec<i64> = courses_b.iter().copied().collect();

            let tenant = Uuid::nil();
            let key_a = params(tenant, &ids_a, &flags_a).derive();
            let key_b = params(tenant, &ids_b, &flags_b).derive();

            if courses_a != courses_b || flags_a.enabled_names_sorted() != flags_b.enabled_names_sorted() {
                prop_assert_ne!(key_a, key_b);
            } else {
                prop_assert_eq!(key_a, key_b);
            }
        }
    }
}

//! Tenant configuration
//!
//! Each tenant (company) carries its own report configuration: daily request
//! quota, cache policy, enabled courses, visible fields, and the bounded
//! look-back window applied on a client's very first sync. Configuration is
//! written by administrators; the core reads it, with one exception - the
//! one-time course auto-enable bootstrap (see the query engine).

use crate::fields::FieldFlags;
use crate::identity::EntityId;
use serde::{Deserialize, Serialize};

/// Enable/disable record for one course within a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSetting {
    pub course_id: i64,
    pub enabled: bool,
}

/// Outcome of resolving a tenant's enabled course set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseSelection {
    /// No course-configuration records exist yet. The query engine performs a
    /// one-time bootstrap: enable every course the tenant currently has.
    Unconfigured,
    /// Configuration exists but no course is enabled. Reports are empty
    /// without touching the snapshot table.
    NoneEnabled,
    /// The enabled course ids (non-empty).
    Enabled(Vec<i64>),
}

/// Per-tenant configuration for the progress report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantConfig {
    pub tenant_id: EntityId,
    pub name: String,
    /// Daily request quota override. `None` or non-positive means "use the
    /// global default".
    pub daily_quota: Option<i64>,
    /// Whether the response cache is consulted for this tenant at all.
    pub cache_enabled: bool,
    /// Cache time-to-live in minutes, converted to an absolute expiry at
    /// write time.
    pub cache_ttl_minutes: i64,
    /// Course configuration records. `None` means the tenant has never been
    /// configured (bootstrap pending); `Some` is authoritative.
    pub course_settings: Option<Vec<CourseSetting>>,
    /// Which report fields this tenant's clients may see.
    pub field_flags: FieldFlags,
    /// Bounded look-back window, in hours, applied on a credential's first
    /// sync to avoid returning an overwhelming historical backlog.
    pub first_sync_hours: Option<i64>,
    /// Administratively force full-sync classification for every request.
    pub force_full_sync: bool,
}

impl TenantConfig {
    /// Minimal config with library defaults, used by tests and bootstrap.
    pub fn new(tenant_id: EntityId, name: impl Into<String>) -> Self {
        Self {
            tenant_id,
            name: name.into(),
            daily_quota: None,
            cache_enabled: true,
            cache_ttl_minutes: 30,
            course_settings: None,
            field_flags: FieldFlags::default(),
            first_sync_hours: None,
            force_full_sync: false,
        }
    }

    /// Effective daily quota: the tenant override when set and positive,
    /// otherwise the supplied global default.
    pub fn effective_quota(&self, global_default: i64) -> i64 {
        match self.daily_quota {
            Some(q) if q > 0 => q,
            _ => global_default,
        }
    }

    /// Resolve the enabled course set.
    pub fn course_selection(&self) -> CourseSelection {
        match &self.course_settings {
            None => CourseSelection::Unconfigured,
            Some(settings) => {
                let mut ids: Vec<i64> = settings
                    .iter()
                    .filter(|s| s.enabled)
                    .map(|s| s.course_id)
                    .collect();
                if ids.is_empty() {
                    CourseSelection::NoneEnabled
                } else {
                    ids.sort_unstable();
                    ids.dedup();
                    CourseSelection::Enabled(ids)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn config() -> TenantConfig {
        TenantConfig::new(Uuid::now_v7(), "Acme Corp")
    }

    #[test]
    fn test_effective_quota_prefers_positive_override() {
        let mut cfg = config();
        assert_eq!(cfg.effective_quota(500), 500);

        cfg.daily_quota = Some(100);
        assert_eq!(cfg.effective_quota(500), 100);

        // Non-positive overrides fall back to the default.
        cfg.daily_quota = Some(0);
        assert_eq!(cfg.effective_quota(500), 500);
        cfg.daily_quota = Some(-5);
        assert_eq!(cfg.effective_quota(500), 500);
    }

    #[test]
    fn test_course_selection_unconfigured() {
        let cfg = config();
        assert_eq!(cfg.course_selection(), CourseSelection::Unconfigured);
    }

    #[test]
    fn test_course_selection_all_disabled() {
        let mut cfg = config();
        cfg.course_settings = Some(vec![
            CourseSetting {
                course_id: 5,
                enabled: false,
            },
            CourseSetting {
                course_id: 7,
                enabled: false,
            },
        ]);
        assert_eq!(cfg.course_selection(), CourseSelection::NoneEnabled);
    }

    #[test]
    fn test_course_selection_sorted_and_deduped() {
        let mut cfg = config();
        cfg.course_settings = Some(vec![
            CourseSetting {
                course_id: 7,
                enabled: true,
            },
            CourseSetting {
                course_id: 5,
                enabled: true,
            },
            CourseSetting {
                course_id: 7,
                enabled: true,
            },
            CourseSetting {
                course_id: 9,
                enabled: false,
            },
        ]);
        assert_eq!(cfg.course_selection(), CourseSelection::Enabled(vec![5, 7]));
    }

    #[test]
    fn test_configured_but_empty_is_none_enabled() {
        let mut cfg = config();
        cfg.course_settings = Some(Vec::new());
        assert_eq!(cfg.course_selection(), CourseSelection::NoneEnabled);
    }
}

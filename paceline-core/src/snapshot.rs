//! Reporting snapshot rows
//!
//! A `ProgressRow` is one (user, course) progress fact, denormalized by an
//! external batch process into the per-tenant snapshot table. The core only
//! reads these rows; `is_deleted` rows are excluded from every read path.

use crate::identity::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};

/// Completion state of a user within a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl CompletionStatus {
    /// Wire/database representation.
    pub fn as_str(self) -> &'static str {
        match self {
            CompletionStatus::NotStarted => "not_started",
            CompletionStatus::InProgress => "in_progress",
            CompletionStatus::Completed => "completed",
        }
    }

    /// Parse the wire/database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(CompletionStatus::NotStarted),
            "in_progress" => Some(CompletionStatus::InProgress),
            "completed" => Some(CompletionStatus::Completed),
            _ => None,
        }
    }
}

/// One denormalized (user, course) progress fact for a tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRow {
    pub tenant_id: EntityId,
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub course_id: i64,
    pub course_name: String,
    pub status: CompletionStatus,
    pub percent_complete: f64,
    pub time_enrolled: Option<Timestamp>,
    pub time_started: Option<Timestamp>,
    pub time_completed: Option<Timestamp>,
    /// When the batch process last touched this row; drives incremental sync.
    pub last_updated: Timestamp,
    /// Soft-delete marker. Deleted rows never appear in reads.
    pub is_deleted: bool,
}

impl ProgressRow {
    /// Identity ordering key: (user_id, course_id).
    pub fn identity_key(&self) -> (i64, i64) {
        (self.user_id, self.course_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_status_round_trip() {
        for status in [
            CompletionStatus::NotStarted,
            CompletionStatus::InProgress,
            CompletionStatus::Completed,
        ] {
            assert_eq!(CompletionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(CompletionStatus::parse("bogus"), None);
    }
}

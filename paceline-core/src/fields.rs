//! Report field flags
//!
//! Tenants control which columns of the progress report are visible to their
//! API clients. Each field has an independent flag; timestamp fields come in
//! paired human-readable and raw (epoch seconds) forms, each flagged on its
//! own. A field absent from the flag set simply means "omit" - never an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A projectable column of the progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportField {
    UserId,
    Username,
    Email,
    CourseId,
    CourseName,
    Status,
    PercentComplete,
    TimeEnrolled,
    TimeEnrolledRaw,
    TimeStarted,
    TimeStartedRaw,
    TimeCompleted,
    TimeCompletedRaw,
    LastUpdated,
    LastUpdatedRaw,
}

impl ReportField {
    /// The wire name of this field, as it appears in projected records and in
    /// the field-set fingerprint.
    pub fn name(self) -> &'static str {
        match self {
            ReportField::UserId => "user_id",
            ReportField::Username => "username",
            ReportField::Email => "email",
            ReportField::CourseId => "course_id",
            ReportField::CourseName => "course_name",
            ReportField::Status => "status",
            ReportField::PercentComplete => "percent_complete",
            ReportField::TimeEnrolled => "time_enrolled",
            ReportField::TimeEnrolledRaw => "time_enrolled_raw",
            ReportField::TimeStarted => "time_started",
            ReportField::TimeStartedRaw => "time_started_raw",
            ReportField::TimeCompleted => "time_completed",
            ReportField::TimeCompletedRaw => "time_completed_raw",
            ReportField::LastUpdated => "last_updated",
            ReportField::LastUpdatedRaw => "last_updated_raw",
        }
    }

    /// All known fields.
    pub fn all() -> &'static [ReportField] {
        &[
            ReportField::UserId,
            ReportField::Username,
            ReportField::Email,
            ReportField::CourseId,
            ReportField::CourseName,
            ReportField::Status,
            ReportField::PercentComplete,
            ReportField::TimeEnrolled,
            ReportField::TimeEnrolledRaw,
            ReportField::TimeStarted,
            ReportField::TimeStartedRaw,
            ReportField::TimeCompleted,
            ReportField::TimeCompletedRaw,
            ReportField::LastUpdated,
            ReportField::LastUpdatedRaw,
        ]
    }
}

/// Per-tenant visibility flags for report fields.
///
/// Stored as an explicit map so a tenant's configuration serializes
/// deterministically (BTreeMap keeps field order stable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFlags {
    flags: BTreeMap<ReportField, bool>,
}

impl FieldFlags {
    /// An empty flag set: every field omitted.
    pub fn none() -> Self {
        Self {
            flags: BTreeMap::new(),
        }
    }

    /// Build a flag set from an iterator of enabled fields.
    pub fn from_enabled(fields: impl IntoIterator<Item = ReportField>) -> Self {
        let mut flags = BTreeMap::new();
        for field in fields {
            flags.insert(field, true);
        }
        Self { flags }
    }

    /// Set the flag for one field.
    pub fn set(&mut self, field: ReportField, enabled: bool) {
        self.flags.insert(field, enabled);
    }

    /// Whether the given field is flagged visible.
    pub fn is_enabled(&self, field: ReportField) -> bool {
        self.flags.get(&field).copied().unwrap_or(false)
    }

    /// The enabled fields, in stable (enum-order) sequence.
    pub fn enabled(&self) -> Vec<ReportField> {
        self.flags
            .iter()
            .filter(|(_, on)| **on)
            .map(|(field, _)| *field)
            .collect()
    }

    /// The wire names of enabled fields, lexically sorted. This is the input
    /// to the field-set cache fingerprint.
    pub fn enabled_names_sorted(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.enabled().iter().map(|f| f.name()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for FieldFlags {
    /// Default tenant visibility: identity, status, and human-readable
    /// completion times.
    fn default() -> Self {
        Self::from_enabled([
            ReportField::UserId,
            ReportField::Username,
            ReportField::Email,
            ReportField::CourseId,
            ReportField::CourseName,
            ReportField::Status,
            ReportField::PercentComplete,
            ReportField::TimeCompleted,
            ReportField::LastUpdated,
        ])
    }
}

//! Response projection
//!
//! Maps an internal `ProgressRow` to the tenant-configured public field
//! subset. Timestamps are emitted in a human-readable RFC 3339 form and/or a
//! raw epoch-seconds form, each behind its own flag.

use crate::fields::{FieldFlags, ReportField};
use crate::identity::Timestamp;
use crate::snapshot::ProgressRow;
use serde_json::{Map, Value};

fn human(ts: Option<Timestamp>) -> Value {
    match ts {
        Some(t) => Value::String(t.to_rfc3339()),
        None => Value::Null,
    }
}

fn raw(ts: Option<Timestamp>) -> Value {
    match ts {
        Some(t) => Value::from(t.timestamp()),
        None => Value::Null,
    }
}

/// Project one row through the tenant's field flags.
///
/// Only flagged fields appear in the output object; a missing flag means
/// "omit", never an error.
pub fn project_row(row: &ProgressRow, flags: &FieldFlags) -> Map<String, Value> {
    let mut out = Map::new();
    for field in flags.enabled() {
        let value = match field {
            ReportField::UserId => Value::from(row.user_id),
            ReportField::Username => Value::String(row.username.clone()),
            ReportField::Email => Value::String(row.email.clone()),
            ReportField::CourseId => Value::from(row.course_id),
            ReportField::CourseName => Value::String(row.course_name.clone()),
            ReportField::Status => Value::String(row.status.as_str().to_string()),
            ReportField::PercentComplete => Value::from(row.percent_complete),
            ReportField::TimeEnrolled => human(row.time_enrolled),
            ReportField::TimeEnrolledRaw => raw(row.time_enrolled),
            ReportField::TimeStarted => human(row.time_started),
            ReportField::TimeStartedRaw => raw(row.time_started),
            ReportField::TimeCompleted => human(row.time_completed),
            ReportField::TimeCompletedRaw => raw(row.time_completed),
            ReportField::LastUpdated => human(Some(row.last_updated)),
            ReportField::LastUpdatedRaw => raw(Some(row.last_updated)),
        };
        out.insert(field.name().to_string(), value);
    }
    out
}

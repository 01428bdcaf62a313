//! Paceline Core - Domain Types for Multi-Tenant Progress Reporting
//!
//! This crate defines the data model and pure logic shared by the Paceline
//! workspace: tenant configuration, snapshot rows, sync-mode resolution,
//! cache-key derivation, and response projection. Anything that touches a
//! store or the network lives in `paceline-store` / `paceline-api`.

pub mod cache_key;
pub mod error;
pub mod fields;
pub mod identity;
pub mod project;
pub mod request_log;
pub mod snapshot;
pub mod sync;
pub mod tenant;

pub use cache_key::{course_fingerprint, field_fingerprint, CacheKeyParams, COURSE_FP_NONE};
pub use error::{ConfigError, PacelineError, PacelineResult, StorageError, ValidationError};
pub use fields::{FieldFlags, ReportField};
pub use identity::{credential_fingerprint, new_entity_id, Credential, EntityId, Timestamp};
pub use project::project_row;
pub use request_log::{Alert, AlertSeverity, RequestLogEntry, RequestOutcome};
pub use snapshot::{CompletionStatus, ProgressRow};
pub use sync::{resolve_sync_mode, SyncMode, SyncOutcome, SyncStatus};
pub use tenant::{CourseSelection, CourseSetting, TenantConfig};

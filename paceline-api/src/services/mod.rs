//! Service layer for the Paceline API
//!
//! Each service wraps one concern of the report pipeline:
//!
//! - `tenant_cache`: memoized tenant-config access with explicit invalidation
//! - `rate_limit`: log-count daily quota enforcement
//! - `response_cache`: keyed response cache over a `ResponseCacheStore`
//! - `engine`: snapshot/live-join query engine with course bootstrap
//! - `sync_service`: sync-status reads and the batch-job writer
//! - `report`: the per-request pipeline gluing the above together

pub mod engine;
pub mod rate_limit;
pub mod report;
pub mod response_cache;
pub mod sync_service;
pub mod tenant_cache;

pub use engine::QueryEngine;
pub use rate_limit::RateLimiter;
pub use report::{ReportService, RequestMeta};
pub use response_cache::ResponseCache;
pub use sync_service::SyncService;
pub use tenant_cache::TenantConfigCache;

//! Paceline Store - Storage Traits and In-Memory Backend
//!
//! This crate defines the async storage traits the report engine is written
//! against, plus `MemoryStore`, an in-memory implementation of all of them.
//! The PostgreSQL backend lives in `paceline-api` next to its pool config.

pub mod memory;
pub mod traits;

pub use memory::MemoryStore;
pub use traits::{
    AlertSink, CacheEntry, CredentialStore, RequestLogStore, ResponseCacheStore, SnapshotOrder,
    SnapshotQuery, SnapshotStore, SourceStore, StoreResult, SyncStatusStore, TenantConfigStore,
};

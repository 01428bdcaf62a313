//! Identity types for Paceline entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

/// Compute the SHA-256 hex fingerprint of an opaque credential token.
///
/// Sync status is keyed by `(tenant_id, credential_fingerprint)` so the raw
/// token never needs to be persisted alongside sync metadata.
pub fn credential_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// An API credential: an opaque bearer token bound to one identity and,
/// transitively, one tenant. Issued externally; the core only validates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Unique credential identifier.
    pub credential_id: EntityId,
    /// The opaque token value presented by clients.
    pub token: String,
    /// The identity (caller) this credential belongs to.
    pub identity_id: EntityId,
    /// The tenant the identity belongs to.
    pub tenant_id: EntityId,
    /// Start of the validity window.
    pub valid_from: Timestamp,
    /// End of the validity window.
    pub valid_until: Timestamp,
}

impl Credential {
    /// Check whether the credential is valid at the given instant.
    pub fn is_valid_at(&self, at: Timestamp) -> bool {
        at >= self.valid_from && at <= self.valid_until
    }

    /// SHA-256 hex fingerprint of this credential's token.
    pub fn fingerprint(&self) -> String {
        credential_fingerprint(&self.token)
    }
}

//! Request log and alert records
//!
//! The request log is an append-only store of every API call: identity,
//! tenant, endpoint, outcome, latency. It serves two purposes: audit, and
//! the daily counts the rate limiter reads. Entries are never updated or
//! deleted by the core.

use crate::identity::{new_entity_id, EntityId, Timestamp};
use serde::{Deserialize, Serialize};

/// How a logged request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    Success,
    Failed,
    /// The single boundary violation row written when an identity first
    /// crosses its daily quota. Counted toward the quota; excluded from
    /// performance/audit listings.
    RateLimited,
}

/// One append-only request log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestLogEntry {
    pub entry_id: EntityId,
    pub tenant_id: EntityId,
    pub identity_id: EntityId,
    pub endpoint: String,
    pub outcome: RequestOutcome,
    pub record_count: i64,
    pub error: Option<String>,
    pub latency_ms: i64,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: Timestamp,
}

impl RequestLogEntry {
    /// Build the boundary violation entry for a rate-limited identity.
    pub fn violation(
        tenant_id: EntityId,
        identity_id: EntityId,
        endpoint: impl Into<String>,
        quota: i64,
        at: Timestamp,
    ) -> Self {
        Self {
            entry_id: new_entity_id(),
            tenant_id,
            identity_id,
            endpoint: endpoint.into(),
            outcome: RequestOutcome::RateLimited,
            record_count: 0,
            error: Some(format!("daily quota of {} requests exceeded", quota)),
            latency_ms: 0,
            client_ip: None,
            user_agent: None,
            created_at: at,
        }
    }
}

/// Severity of an administrative alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// A structured violation/alert record handed to the alert sink.
/// Fire-and-forget from the core's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: String,
    pub severity: AlertSeverity,
    pub message: String,
    pub tenant_id: EntityId,
    pub created_at: Timestamp,
}

impl Alert {
    /// The rate-limit violation alert emitted once per identity/day boundary.
    pub fn rate_limit_violation(
        tenant_id: EntityId,
        identity_id: EntityId,
        count: i64,
        quota: i64,
        at: Timestamp,
    ) -> Self {
        Self {
            kind: "rate_limit_violation".to_string(),
            severity: AlertSeverity::Warning,
            message: format!(
                "identity {} reached its daily quota ({} of {} requests)",
                identity_id, count, quota
            ),
            tenant_id,
            created_at: at,
        }
    }
}

//! Daily request quota enforcement.
//!
//! Quotas are enforced by counting request-log entries for the identity
//! since UTC midnight, against the tenant's quota override (when positive)
//! or the global default. On the exact boundary, one `RateLimited` log row
//! is appended and one alert fired; that row itself counts toward the day,
//! so every later check sees `count > quota` and records nothing. Rejected
//! requests never produce ordinary log entries, keeping the violation row
//! unique per identity per day.
//!
//! Store failures during the check are logged and swallowed: the request is
//! allowed through rather than failing closed on an audit-path outage.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use paceline_core::{Alert, EntityId, RequestLogEntry, TenantConfig, Timestamp};
use paceline_store::{AlertSink, RequestLogStore};
use tracing::warn;

use crate::auth::Clock;
use crate::error::{ApiError, ApiResult};

/// Log-count rate limiter, shared across requests.
pub struct RateLimiter {
    request_log: Arc<dyn RequestLogStore>,
    alerts: Arc<dyn AlertSink>,
    clock: Arc<dyn Clock>,
    default_daily_quota: i64,
}

impl RateLimiter {
    pub fn new(
        request_log: Arc<dyn RequestLogStore>,
        alerts: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
        default_daily_quota: i64,
    ) -> Self {
        Self {
            request_log,
            alerts,
            clock,
            default_daily_quota,
        }
    }

    /// Check the identity's daily count against the tenant's effective quota.
    ///
    /// Returns `Err(TooManyRequests)` with `{count, quota}` details when the
    /// quota is reached. Exactly one logical check per request.
    pub async fn check(
        &self,
        config: &TenantConfig,
        identity_id: EntityId,
        endpoint: &str,
    ) -> ApiResult<()> {
        let now = self.clock.now();
        let midnight = utc_midnight(now);
        let quota = config.effective_quota(self.default_daily_quota);

        let count = match self
            .request_log
            .count_for_identity_since(identity_id, midnight)
            .await
        {
            Ok(count) => count,
            Err(err) => {
                // Fail open on log-store errors.
                warn!(%identity_id, error = %err, "rate limit check failed, allowing request");
                return Ok(());
            }
        };

        if count < quota {
            return Ok(());
        }

        if count == quota {
            // First crossing today: record the violation once.
            let entry =
                RequestLogEntry::violation(config.tenant_id, identity_id, endpoint, quota, now);
            if let Err(err) = self.request_log.append(&entry).await {
                warn!(%identity_id, error = %err, "failed to record rate limit violation");
            }

            let alert =
                Alert::rate_limit_violation(config.tenant_id, identity_id, count, quota, now);
            if let Err(err) = self.alerts.notify(alert).await {
                warn!(%identity_id, error = %err, "failed to deliver rate limit alert");
            }
        }

        Err(ApiError::too_many_requests(count, quota))
    }
}

/// Start of the current UTC day.
fn utc_midnight(now: Timestamp) -> Timestamp {
    let date = now.date_naive();
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

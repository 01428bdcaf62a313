//! Authentication for the Paceline API
//!
//! Requests authenticate with an opaque token presented either as
//! `Authorization: Bearer <token>` or `X-API-Key: <token>`. The token is
//! resolved against the credential store; a resolved, in-window credential
//! yields an [`AuthContext`] carrying the identity, its tenant, and the
//! token's SHA-256 fingerprint (the sync-status key).
//!
//! Token issuance is out of scope; this module only validates.

use std::sync::Arc;

use paceline_core::{EntityId, Timestamp};
use paceline_store::CredentialStore;

use crate::error::{ApiError, ApiResult};

// ============================================================================
// CLOCK
// ============================================================================

/// Time source seam so validity windows and rate-limit days are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now()
    }
}

/// Fixed time for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

// ============================================================================
// AUTH CONTEXT
// ============================================================================

/// Authenticated caller context, injected into request extensions by the
/// auth middleware.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthContext {
    /// The identity (caller) behind the credential.
    pub identity_id: EntityId,
    /// The tenant every read is scoped to.
    pub tenant_id: EntityId,
    /// SHA-256 hex fingerprint of the presented token.
    pub credential_hash: String,
}

// ============================================================================
// AUTHENTICATION
// ============================================================================

/// Extract the opaque token from the auth headers.
///
/// `Authorization: Bearer` wins over `X-API-Key` when both are present.
pub fn extract_token<'a>(
    auth_header: Option<&'a str>,
    api_key_header: Option<&'a str>,
) -> ApiResult<&'a str> {
    if let Some(value) = auth_header {
        return value.strip_prefix("Bearer ").map(str::trim).ok_or_else(|| {
            ApiError::invalid_token("Authorization header must use Bearer scheme")
        });
    }
    api_key_header.ok_or_else(|| {
        ApiError::unauthorized("Authentication required: provide Authorization or X-API-Key header")
    })
}

/// An authentication failure. When the credential itself resolved (only a
/// later check failed), the caller context rides along so the failure can
/// still be request-logged.
#[derive(Debug)]
pub struct AuthRejection {
    pub error: ApiError,
    pub context: Option<AuthContext>,
}

impl From<ApiError> for AuthRejection {
    fn from(error: ApiError) -> Self {
        Self {
            error,
            context: None,
        }
    }
}

/// Resolve and validate a token against the credential store.
pub async fn authenticate(
    credentials: &Arc<dyn CredentialStore>,
    clock: &Arc<dyn Clock>,
    auth_header: Option<&str>,
    api_key_header: Option<&str>,
) -> Result<AuthContext, AuthRejection> {
    let token = extract_token(auth_header, api_key_header)?;
    if token.is_empty() {
        return Err(ApiError::invalid_token("Empty credential token").into());
    }

    let credential = credentials
        .resolve(token)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::invalid_token("Unknown credential token"))?;

    let context = AuthContext {
        identity_id: credential.identity_id,
        tenant_id: credential.tenant_id,
        credential_hash: credential.fingerprint(),
    };

    if !credential.is_valid_at(clock.now()) {
        return Err(AuthRejection {
            error: ApiError::token_expired(),
            context: Some(context),
        });
    }

    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::Utc;
    use paceline_store::MemoryStore;
    use paceline_test_utils::{credential_for, expired_credential_for, new_entity_id};

    fn stores() -> (Arc<dyn CredentialStore>, Arc<dyn Clock>) {
        (Arc::new(MemoryStore::new()), Arc::new(SystemClock))
    }

    #[test]
    fn test_extract_token_prefers_bearer() {
        let token = extract_token(Some("Bearer abc"), Some("xyz")).unwrap();
        assert_eq!(token, "abc");

        let token = extract_token(None, Some("xyz")).unwrap();
        assert_eq!(token, "xyz");
    }

    #[test]
    fn test_extract_token_rejects_non_bearer_scheme() {
        let err = extract_token(Some("Basic abc"), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidToken);

        let err = extract_token(None, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_authenticate_unknown_token() {
        let (credentials, clock) = stores();
        let rejection = authenticate(&credentials, &clock, Some("Bearer nope"), None)
            .await
            .unwrap_err();
        assert_eq!(rejection.error.code, ErrorCode::InvalidToken);
        assert!(rejection.context.is_none());
    }

    #[tokio::test]
    async fn test_authenticate_valid_and_expired() {
        let store = MemoryStore::new();
        let tenant = new_entity_id();
        let valid = credential_for(tenant, "tok_valid");
        let expired = expired_credential_for(tenant, "tok_expired");
        store.seed_credential(valid.clone()).unwrap();
        store.seed_credential(expired).unwrap();

        let credentials: Arc<dyn CredentialStore> = Arc::new(store);
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(Utc::now()));

        let ctx = authenticate(&credentials, &clock, None, Some("tok_valid"))
            .await
            .unwrap();
        assert_eq!(ctx.tenant_id, tenant);
        assert_eq!(ctx.identity_id, valid.identity_id);
        assert_eq!(ctx.credential_hash, valid.fingerprint());

        let rejection = authenticate(&credentials, &clock, None, Some("tok_expired"))
            .await
            .unwrap_err();
        assert_eq!(rejection.error.code, ErrorCode::TokenExpired);
        let expired_ctx = rejection.context.unwrap();
        assert_eq!(expired_ctx.tenant_id, tenant);
    }
}

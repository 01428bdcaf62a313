//! End-to-end tests for the progress report pipeline: auth, rate limits,
//! sync-mode classification, caching, fallback and the admin surface.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use common::{get_anon, get_authed, post_authed, spawn_default_app};
use paceline_core::RequestOutcome;
use paceline_test_utils::{
    cache_entry, completed_row, progress_row, seeded_tenant, sync_success, MemoryStore,
};

const PROGRESS: &str = "/api/v1/report/progress";

// ============================================================================
// AUTHENTICATION
// ============================================================================

#[tokio::test]
async fn progress_without_credentials_is_unauthorized() {
    let app = spawn_default_app(MemoryStore::new());

    let (status, body) = get_anon(&app.router, PROGRESS).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn progress_with_expired_credential_is_unauthorized() {
    let seeded = seeded_tenant(&[(1, 5)]).unwrap();
    let expired =
        paceline_test_utils::expired_credential_for(seeded.config.tenant_id, "tok_expired");
    seeded.store.seed_credential(expired).unwrap();
    let app = spawn_default_app(seeded.store);

    let (status, body) = get_authed(&app.router, PROGRESS, "tok_expired").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "TOKEN_EXPIRED");

    // The credential resolved to a caller, so the rejection is logged.
    let entries = app.store.log_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, RequestOutcome::Failed);
    assert_eq!(entries[0].endpoint, PROGRESS);
}

// ============================================================================
// VALIDATION
// ============================================================================

#[tokio::test]
async fn zero_limit_is_rejected() {
    let seeded = seeded_tenant(&[(1, 5)]).unwrap();
    let token = seeded.credential.token.clone();
    let app = spawn_default_app(seeded.store);

    let path = format!("{}?limit=0", PROGRESS);
    let (status, body) = get_authed(&app.router, &path, &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_RANGE");
}

#[tokio::test]
async fn negative_offset_is_rejected() {
    let seeded = seeded_tenant(&[(1, 5)]).unwrap();
    let token = seeded.credential.token.clone();
    let app = spawn_default_app(seeded.store);

    let path = format!("{}?offset=-1", PROGRESS);
    let (status, _) = get_authed(&app.router, &path, &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejected_pagination_still_logs_the_failure() {
    let seeded = seeded_tenant(&[(1, 5)]).unwrap();
    let tenant_id = seeded.config.tenant_id;
    let token = seeded.credential.token.clone();
    let app = spawn_default_app(seeded.store);

    let path = format!("{}?limit=0", PROGRESS);
    let (status, body) = get_authed(&app.router, &path, &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_RANGE");

    let entries = app.store.log_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].tenant_id, tenant_id);
    assert_eq!(entries[0].outcome, RequestOutcome::Failed);
    assert!(entries[0].error.as_deref().unwrap().contains("limit"));
}

#[tokio::test]
async fn non_numeric_limit_is_rejected_with_the_json_error_shape() {
    let seeded = seeded_tenant(&[(1, 5)]).unwrap();
    let token = seeded.credential.token.clone();
    let app = spawn_default_app(seeded.store);

    let path = format!("{}?limit=abc", PROGRESS);
    let (status, body) = get_authed(&app.router, &path, &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let entries = app.store.log_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, RequestOutcome::Failed);
}

// ============================================================================
// SYNC MODES
// ============================================================================

#[tokio::test]
async fn first_request_without_status_uses_first_mode() {
    let seeded = seeded_tenant(&[(1, 5), (2, 5)]).unwrap();
    let token = seeded.credential.token.clone();
    let app = spawn_default_app(seeded.store);

    let (status, body) = get_authed(&app.router, PROGRESS, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sync_mode"], "first");
    assert_eq!(body["record_count"], 2);
}

#[tokio::test]
async fn first_sync_window_prunes_old_completions() {
    let seeded = seeded_tenant(&[(1, 5)]).unwrap();
    let tenant_id = seeded.config.tenant_id;
    let token = seeded.credential.token.clone();

    let mut config = seeded.config.clone();
    config.first_sync_hours = Some(24);
    seeded.store.seed_config(config).unwrap();

    let now = Utc::now();
    seeded
        .store
        .seed_snapshot_row(completed_row(tenant_id, 2, 5, now - Duration::hours(48)))
        .unwrap();
    seeded
        .store
        .seed_snapshot_row(completed_row(tenant_id, 3, 5, now - Duration::hours(1)))
        .unwrap();

    let app = spawn_default_app(seeded.store);
    let (status, body) = get_authed(&app.router, PROGRESS, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sync_mode"], "first");

    // The 48h-old completion falls outside the 24h window; the in-progress
    // row and the fresh completion stay.
    assert_eq!(body["record_count"], 2);
    let users: Vec<i64> = body["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["user_id"].as_i64().unwrap())
        .collect();
    assert_eq!(users, vec![1, 3]);
}

#[tokio::test]
async fn successful_status_switches_to_incremental() {
    let seeded = seeded_tenant(&[(1, 5), (2, 5), (3, 5)]).unwrap();
    let tenant_id = seeded.config.tenant_id;
    let token = seeded.credential.token.clone();
    let now = Utc::now();

    // Only rows updated after the last sync come back, newest first.
    let status_row = sync_success(tenant_id, &seeded.credential, now - Duration::hours(3));
    seeded.store.seed_sync_status(status_row).unwrap();

    let mut fresh = progress_row(tenant_id, 2, 5);
    fresh.last_updated = now - Duration::minutes(30);
    seeded.store.seed_snapshot_row(fresh).unwrap();
    let mut fresher = progress_row(tenant_id, 3, 5);
    fresher.last_updated = now - Duration::minutes(5);
    seeded.store.seed_snapshot_row(fresher).unwrap();
    let mut stale = progress_row(tenant_id, 1, 5);
    stale.last_updated = now - Duration::hours(5);
    seeded.store.seed_snapshot_row(stale).unwrap();

    let app = spawn_default_app(seeded.store);
    let (status, body) = get_authed(&app.router, PROGRESS, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sync_mode"], "incremental");
    assert_eq!(body["record_count"], 2);

    let users: Vec<i64> = body["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["user_id"].as_i64().unwrap())
        .collect();
    assert_eq!(users, vec![3, 2]);
}

#[tokio::test]
async fn force_full_sync_overrides_status() {
    let seeded = seeded_tenant(&[(1, 5), (2, 5)]).unwrap();
    let tenant_id = seeded.config.tenant_id;
    let token = seeded.credential.token.clone();

    let mut config = seeded.config.clone();
    config.force_full_sync = true;
    seeded.store.seed_config(config).unwrap();
    let status_row = sync_success(
        tenant_id,
        &seeded.credential,
        Utc::now() - Duration::hours(1),
    );
    seeded.store.seed_sync_status(status_row).unwrap();

    let app = spawn_default_app(seeded.store);
    let (status, body) = get_authed(&app.router, PROGRESS, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sync_mode"], "full");
    assert_eq!(body["record_count"], 2);
}

// ============================================================================
// RESPONSE CACHE
// ============================================================================

#[tokio::test]
async fn repeated_request_serves_cached_payload_verbatim() {
    let seeded = seeded_tenant(&[(1, 5), (2, 5)]).unwrap();
    let token = seeded.credential.token.clone();
    let app = spawn_default_app(seeded.store.clone());

    let (status1, body1) = get_authed(&app.router, PROGRESS, &token).await;
    let (status2, body2) = get_authed(&app.router, PROGRESS, &token).await;

    assert_eq!(status1, StatusCode::OK);
    assert_eq!(status2, StatusCode::OK);
    // Byte-identical replay, generated_at included.
    assert_eq!(body1, body2);
    assert_eq!(app.store.cache_entry_count().unwrap(), 1);

    // Both reads are logged even when the second one never hits the engine.
    let log = app.store.log_entries().unwrap();
    assert_eq!(log.len(), 2);
    assert!(log
        .iter()
        .all(|e| e.outcome == RequestOutcome::Success && e.record_count == 2));
}

#[tokio::test]
async fn course_order_does_not_change_the_cache_key() {
    let seeded = seeded_tenant(&[(1, 5), (2, 7)]).unwrap();
    let tenant_id = seeded.config.tenant_id;
    let token = seeded.credential.token.clone();
    let app = spawn_default_app(seeded.store.clone());

    let (_, body1) = get_authed(&app.router, PROGRESS, &token).await;

    let mut reversed = seeded.config.clone();
    if let Some(settings) = reversed.course_settings.as_mut() {
        settings.reverse();
    }
    app.store.seed_config(reversed).unwrap();
    app.state.tenant_configs.invalidate(tenant_id);

    let (_, body2) = get_authed(&app.router, PROGRESS, &token).await;
    assert_eq!(body1, body2);
    assert_eq!(app.store.cache_entry_count().unwrap(), 1);
}

#[tokio::test]
async fn disabled_cache_bypasses_storage() {
    let seeded = seeded_tenant(&[(1, 5)]).unwrap();
    let token = seeded.credential.token.clone();

    let mut config = seeded.config.clone();
    config.cache_enabled = false;
    seeded.store.seed_config(config).unwrap();

    let app = spawn_default_app(seeded.store.clone());
    let (status, _) = get_authed(&app.router, PROGRESS, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.cache_entry_count().unwrap(), 0);
}

// ============================================================================
// RATE LIMITING
// ============================================================================

#[tokio::test]
async fn quota_boundary_logs_exactly_one_violation() {
    let seeded = seeded_tenant(&[(1, 5)]).unwrap();
    let token = seeded.credential.token.clone();

    let mut config = seeded.config.clone();
    config.daily_quota = Some(1);
    seeded.store.seed_config(config).unwrap();

    let app = spawn_default_app(seeded.store.clone());

    let (first, _) = get_authed(&app.router, PROGRESS, &token).await;
    assert_eq!(first, StatusCode::OK);

    // Boundary crossing: rejected, one violation row, one alert.
    let (second, body) = get_authed(&app.router, PROGRESS, &token).await;
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "TOO_MANY_REQUESTS");
    assert_eq!(body["details"]["quota"], 1);

    // Past the boundary: still rejected, nothing further written.
    let (third, _) = get_authed(&app.router, PROGRESS, &token).await;
    assert_eq!(third, StatusCode::TOO_MANY_REQUESTS);

    let log = app.store.log_entries().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].outcome, RequestOutcome::Success);
    assert_eq!(log[1].outcome, RequestOutcome::RateLimited);
    assert_eq!(app.store.emitted_alerts().unwrap().len(), 1);
}

// ============================================================================
// FALLBACK
// ============================================================================

#[tokio::test]
async fn empty_snapshot_falls_back_to_live_with_pagination() {
    let store = MemoryStore::new();
    let tenant_id = paceline_test_utils::new_entity_id();
    let config = paceline_test_utils::tenant_config_with_courses(tenant_id, &[9]);
    let credential = paceline_test_utils::credential_for(tenant_id, "tok_live");
    store.seed_config(config).unwrap();
    store.seed_credential(credential).unwrap();
    store.seed_tenant_courses(tenant_id, vec![9]).unwrap();
    for user_id in 1..=6 {
        store
            .seed_live_row(progress_row(tenant_id, user_id, 9))
            .unwrap();
    }

    let app = spawn_default_app(store);
    let path = format!("{}?limit=2&offset=2", PROGRESS);
    let (status, body) = get_authed(&app.router, &path, "tok_live").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record_count"], 2);
    let users: Vec<i64> = body["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["user_id"].as_i64().unwrap())
        .collect();
    assert_eq!(users, vec![3, 4]);
}

// ============================================================================
// ADMIN
// ============================================================================

#[tokio::test]
async fn cache_clear_removes_tenant_entries() {
    let seeded = seeded_tenant(&[(1, 5)]).unwrap();
    let token = seeded.credential.token.clone();
    let app = spawn_default_app(seeded.store.clone());

    let (status, _) = get_authed(&app.router, PROGRESS, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.cache_entry_count().unwrap(), 1);

    let (status, body) =
        post_authed(&app.router, "/api/v1/admin/cache/clear", &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scope"], "tenant");
    assert_eq!(body["cleared"], 1);
    assert_eq!(app.store.cache_entry_count().unwrap(), 0);
}

#[tokio::test]
async fn cache_purge_drops_only_expired_entries() {
    use paceline_store::ResponseCacheStore;

    let seeded = seeded_tenant(&[(1, 5)]).unwrap();
    let tenant_id = seeded.config.tenant_id;
    let token = seeded.credential.token.clone();

    let mut stale = cache_entry(tenant_id, "report:stale");
    stale.expires_at = Utc::now() - Duration::minutes(5);
    seeded.store.cache_put(stale).await.unwrap();
    seeded
        .store
        .cache_put(cache_entry(tenant_id, "report:fresh"))
        .await
        .unwrap();

    let app = spawn_default_app(seeded.store.clone());
    let (status, body) =
        post_authed(&app.router, "/api/v1/admin/cache/purge", &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["purged"], 1);
    assert_eq!(app.store.cache_entry_count().unwrap(), 1);
}

#[tokio::test]
async fn recorded_sync_status_is_visible_to_the_caller() {
    let seeded = seeded_tenant(&[(1, 5)]).unwrap();
    let token = seeded.credential.token.clone();
    let app = spawn_default_app(seeded.store);

    let (status, body) = get_authed(&app.router, "/api/v1/report/sync-status", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["synced"], false);

    let (status, _) = post_authed(
        &app.router,
        "/api/v1/admin/sync-status",
        &token,
        json!({ "outcome": "success" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_authed(&app.router, "/api/v1/report/sync-status", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["synced"], true);
    assert_eq!(body["outcome"], "success");
}

#[tokio::test]
async fn effective_config_applies_server_defaults() {
    let seeded = seeded_tenant(&[(1, 5)]).unwrap();
    let token = seeded.credential.token.clone();
    let app = spawn_default_app(seeded.store);

    let (status, body) = get_authed(&app.router, "/api/v1/admin/config", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["daily_quota"], 500);
    assert_eq!(body["cache_enabled"], true);
    assert_eq!(body["configured_courses"], 1);
}

// ============================================================================
// HEALTH
// ============================================================================

#[tokio::test]
async fn health_endpoints_respond_without_auth() {
    let app = spawn_default_app(MemoryStore::new());

    let (status, body) = get_anon(&app.router, "/health/ping").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "pong");

    let (status, body) = get_anon(&app.router, "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

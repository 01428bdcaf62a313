//! OpenAPI Specification for the Paceline API
//!
//! This module defines the OpenAPI document for the Paceline REST API.
//! It uses utoipa to generate the specification from Rust types and
//! route annotations.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::{ApiError, ErrorCode};
use crate::routes::{admin, health, report};

/// OpenAPI document for the Paceline API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Paceline API",
        version = "0.1.0",
        description = "Paginated, multi-tenant course progress reporting with snapshot sync modes, response caching and daily rate limits",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Report", description = "Paginated course progress reads and sync-status views"),
        (name = "Admin", description = "Cache maintenance and sync recording"),
        (name = "Health", description = "Liveness and readiness probes")
    ),
    paths(
        // === Report Routes ===
        report::get_progress,
        report::get_sync_status,

        // === Admin Routes ===
        admin::clear_cache,
        admin::purge_cache,
        admin::record_sync_status,
        admin::get_effective_config,

        // === Health Routes ===
        health::ping,
        health::liveness,
        health::readiness,
    ),
    components(
        schemas(
            // === Error Types ===
            ApiError, ErrorCode,

            // === Report Types ===
            report::SyncStatusResponse,

            // === Admin Types ===
            admin::CacheScope, admin::CacheClearResponse, admin::CachePurgeResponse,
            admin::RecordSyncRequest, admin::EffectiveConfigResponse,

            // === Health Types ===
            health::HealthResponse, health::HealthStatus,
            health::HealthDetails, health::ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme modifier for the OpenAPI document.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Opaque bearer token"))
                        .build(),
                ),
            );
        }
    }
}

impl ApiDoc {
    /// Generate the OpenAPI spec as a JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}

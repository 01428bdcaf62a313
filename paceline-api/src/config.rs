//! API Configuration Module
//!
//! This module provides configuration for CORS, quotas, pagination caps, and
//! cache defaults. Configuration is loaded from environment variables with
//! sensible defaults for development.

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS, quotas, and report defaults.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Rate Limiting Configuration
    // ========================================================================
    /// Global default daily request quota per identity, used when the tenant
    /// carries no positive override.
    pub default_daily_quota: i64,

    // ========================================================================
    // Report Configuration
    // ========================================================================
    /// Default page size when the request omits `limit`.
    pub default_page_limit: i64,

    /// Hard cap on `limit`. Larger values are clamped, not rejected.
    pub max_page_size: i64,

    /// Cache TTL in minutes used when a tenant's configured TTL is not
    /// positive.
    pub default_cache_ttl_minutes: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            // CORS defaults: permissive for development
            cors_origins: Vec::new(), // Empty = allow all
            cors_max_age_secs: 86400, // 24 hours

            default_daily_quota: 500,
            default_page_limit: 100,
            max_page_size: 500,
            default_cache_ttl_minutes: 30,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PACELINE_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `PACELINE_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `PACELINE_DEFAULT_DAILY_QUOTA`: Requests per identity per UTC day (default: 500)
    /// - `PACELINE_DEFAULT_PAGE_LIMIT`: Page size when `limit` is omitted (default: 100)
    /// - `PACELINE_MAX_PAGE_SIZE`: Hard cap on `limit` (default: 500)
    /// - `PACELINE_DEFAULT_CACHE_TTL_MINUTES`: Fallback response-cache TTL (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_origins = std::env::var("PACELINE_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            cors_origins,
            cors_max_age_secs: env_parse("PACELINE_CORS_MAX_AGE_SECS", defaults.cors_max_age_secs),
            default_daily_quota: env_parse(
                "PACELINE_DEFAULT_DAILY_QUOTA",
                defaults.default_daily_quota,
            ),
            default_page_limit: env_parse(
                "PACELINE_DEFAULT_PAGE_LIMIT",
                defaults.default_page_limit,
            ),
            max_page_size: env_parse("PACELINE_MAX_PAGE_SIZE", defaults.max_page_size),
            default_cache_ttl_minutes: env_parse(
                "PACELINE_DEFAULT_CACHE_TTL_MINUTES",
                defaults.default_cache_ttl_minutes,
            ),
        }
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Clamp a requested page limit to `[1, max_page_size]`, substituting the
    /// default when absent.
    pub fn clamp_limit(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_page_limit)
            .min(self.max_page_size)
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

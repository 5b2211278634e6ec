//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::upstream::DataCategory;

/// Reads `name` and parses it, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_secs(name: &str, default: f64) -> Duration {
    Duration::try_from_secs_f64(env_or(name, default))
        .unwrap_or_else(|_| Duration::from_secs_f64(default))
}

// == Cache TTLs ==
/// Freshness window per data category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// Live index quotes
    pub quote: Duration,
    /// Chart snapshots
    pub chart: Duration,
    /// Market summary and sector aggregates
    pub summary: Duration,
}

impl CacheTtls {
    pub fn for_category(&self, category: DataCategory) -> Duration {
        match category {
            DataCategory::Quote => self.quote,
            DataCategory::Chart => self.chart,
            DataCategory::Summary => self.summary,
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            quote: Duration::from_secs(5),
            chart: Duration::from_secs(30),
            summary: Duration::from_secs(10),
        }
    }
}

// == Upstream Config ==
/// Connection settings for the market data provider.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub app_key: String,
    pub app_secret: String,
    /// Bearer token, sent only when present
    pub access_token: Option<String>,
    /// Per-request HTTP timeout
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openapi.koreainvestment.com:9443".to_string(),
            app_key: "test_key".to_string(),
            app_secret: "test_secret".to_string(),
            access_token: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    pub ttls: CacheTtls,
    pub retry: RetryPolicy,
    /// Optional bound on a whole get-or-fetch call
    pub request_deadline: Option<Duration>,
    pub upstream: UpstreamConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `CACHE_TTL_SECONDS` / `CACHE_CHART_TTL_SECONDS` / `CACHE_SUMMARY_TTL_SECONDS` (5 / 30 / 10)
    /// - `MAX_RETRY_ATTEMPTS` (3), `RETRY_DELAY_SECONDS` (1.0), `RETRY_BACKOFF_MULTIPLIER` (2.0)
    /// - `RATE_LIMIT_DELAY_SECONDS` (60), `RETRY_MAX_DELAY_SECONDS` (60)
    /// - `REQUEST_DEADLINE_MS` - per-request deadline (default: none)
    /// - `KOREA_INVESTMENT_BASE_URL`, `KOREA_INVESTMENT_APP_KEY`, `KOREA_INVESTMENT_APP_SECRET`,
    ///   `KOREA_INVESTMENT_ACCESS_TOKEN`, `UPSTREAM_TIMEOUT_SECONDS` (10)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ttls = CacheTtls {
            quote: env_secs("CACHE_TTL_SECONDS", defaults.ttls.quote.as_secs_f64()),
            chart: env_secs("CACHE_CHART_TTL_SECONDS", defaults.ttls.chart.as_secs_f64()),
            summary: env_secs(
                "CACHE_SUMMARY_TTL_SECONDS",
                defaults.ttls.summary.as_secs_f64(),
            ),
        };

        let retry = RetryPolicy::new(
            env_or("MAX_RETRY_ATTEMPTS", defaults.retry.max_attempts),
            env_secs("RETRY_DELAY_SECONDS", defaults.retry.base_delay.as_secs_f64()),
            env_or("RETRY_BACKOFF_MULTIPLIER", defaults.retry.backoff_multiplier),
            env_secs(
                "RATE_LIMIT_DELAY_SECONDS",
                defaults.retry.rate_limit_delay.as_secs_f64(),
            ),
        )
        .with_max_delay(env_secs(
            "RETRY_MAX_DELAY_SECONDS",
            defaults.retry.max_delay.as_secs_f64(),
        ));

        let upstream = UpstreamConfig {
            base_url: env_or("KOREA_INVESTMENT_BASE_URL", defaults.upstream.base_url),
            app_key: env_or("KOREA_INVESTMENT_APP_KEY", defaults.upstream.app_key),
            app_secret: env_or("KOREA_INVESTMENT_APP_SECRET", defaults.upstream.app_secret),
            access_token: env::var("KOREA_INVESTMENT_ACCESS_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            timeout: env_secs(
                "UPSTREAM_TIMEOUT_SECONDS",
                defaults.upstream.timeout.as_secs_f64(),
            ),
        };

        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            ttls,
            retry,
            request_deadline: env::var("REQUEST_DEADLINE_MS")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_millis),
            upstream,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            max_entries: 1000,
            cleanup_interval: 1,
            ttls: CacheTtls::default(),
            retry: RetryPolicy::default(),
            request_deadline: None,
            upstream: UpstreamConfig::default(),
        }
    }
}

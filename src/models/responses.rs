//! Response DTOs for the market data API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::models::Market;
use crate::retry::RetryMetricsSnapshot;

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Current value of one composite index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexQuote {
    pub market: Market,
    pub code: &'static str,
    pub current: f64,
    pub change: f64,
    pub change_rate: f64,
    pub volume: u64,
    pub trading_value: u64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    /// True if served from a fresh cache entry
    pub cached: bool,
}

/// A market that could not be fetched in a multi-market query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketFailure {
    pub market: Market,
    pub error: String,
}

/// Response body for `GET /index`
#[derive(Debug, Clone, Serialize)]
pub struct MarketIndexResponse {
    pub timestamp: String,
    pub indices: Vec<IndexQuote>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<MarketFailure>,
}

impl MarketIndexResponse {
    pub fn new(indices: Vec<IndexQuote>, errors: Vec<MarketFailure>) -> Self {
        Self {
            timestamp: now_rfc3339(),
            indices,
            errors,
        }
    }
}

/// One OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// RFC 3339, market open in KST
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Response body for `GET /chart`
#[derive(Debug, Clone, Serialize)]
pub struct ChartResponse {
    pub market: Market,
    pub period: &'static str,
    pub interval: &'static str,
    pub data_points: usize,
    pub points: Vec<ChartPoint>,
    pub cached: bool,
}

/// Response body for `GET /summary`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSummaryResponse {
    pub timestamp: String,
    pub advancing: u64,
    pub declining: u64,
    pub unchanged: u64,
    pub suspended: u64,
    pub upper_limit: u64,
    pub lower_limit: u64,
    pub new_highs: u64,
    pub new_lows: u64,
    pub market_cap: u64,
    pub foreign_holdings: u64,
    pub cached: bool,
}

/// Current value of one sector index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorQuote {
    pub name: String,
    pub code: String,
    pub current: f64,
    pub change: f64,
    pub change_rate: f64,
    pub volume: u64,
    pub trading_value: u64,
}

/// Response body for `GET /sectors`
#[derive(Debug, Clone, Serialize)]
pub struct SectorResponse {
    pub timestamp: String,
    pub market: Market,
    pub sectors: Vec<SectorQuote>,
    pub cached: bool,
}

/// Response body for `GET /cache/stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub cache: CacheStats,
    pub hit_rate: f64,
    pub max_entries: usize,
    pub retry: RetryMetricsSnapshot,
}

impl StatsResponse {
    pub fn new(cache: CacheStats, max_entries: usize, retry: RetryMetricsSnapshot) -> Self {
        Self {
            hit_rate: cache.hit_rate(),
            cache,
            max_entries,
            retry,
        }
    }
}

/// Response body for the invalidate endpoints
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn key(key: &str, removed: usize) -> Self {
        Self {
            message: format!("Key '{}' invalidated", key),
            removed,
        }
    }

    pub fn all(removed: usize) -> Self {
        Self {
            message: "Cache cleared".to_string(),
            removed,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: now_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
    /// Failure classification for upstream errors ("timeout" when the deadline passed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    /// Upstream attempts made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            kind: None,
            attempts: None,
        }
    }

    pub fn upstream(error: impl Into<String>, kind: &'static str, attempts: u32) -> Self {
        Self {
            error: error.into(),
            kind: Some(kind),
            attempts: Some(attempts),
        }
    }
}

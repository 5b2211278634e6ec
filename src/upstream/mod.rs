//! Upstream Module
//!
//! Boundary to the market data provider. The cache only sees
//! [`UpstreamClient::fetch`] and the classified [`UpstreamError`] it returns.

mod http;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::UpstreamError;
use crate::models::{ChartPeriod, Market};

pub use self::http::HttpUpstream;

// == Data Category ==
/// Freshness class of a request, used to pick its TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataCategory {
    Quote,
    Chart,
    Summary,
}

// == Upstream Request ==
/// One provider query. Equal requests map to the same cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamRequest {
    IndexPrice { market: Market },
    IndexChart { market: Market, period: ChartPeriod },
    MarketSummary,
    SectorIndices { market: Market },
}

impl UpstreamRequest {
    /// Deterministic fingerprint of the query.
    pub fn cache_key(&self) -> String {
        match self {
            UpstreamRequest::IndexPrice { market } => format!("index_price:{}", market.code()),
            UpstreamRequest::IndexChart { market, period } => {
                format!("index_chart:{}:{}", market.code(), period.code())
            }
            UpstreamRequest::MarketSummary => "market_summary".to_string(),
            UpstreamRequest::SectorIndices { market } => {
                format!("sector_indices:{}", market.code())
            }
        }
    }

    pub fn category(&self) -> DataCategory {
        match self {
            UpstreamRequest::IndexPrice { .. } => DataCategory::Quote,
            UpstreamRequest::IndexChart { .. } => DataCategory::Chart,
            UpstreamRequest::MarketSummary | UpstreamRequest::SectorIndices { .. } => {
                DataCategory::Summary
            }
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            UpstreamRequest::IndexPrice { .. } => {
                "/uapi/domestic-stock/v1/quotations/inquire-index-price"
            }
            UpstreamRequest::IndexChart { .. } => {
                "/uapi/domestic-stock/v1/quotations/inquire-index-chart-price"
            }
            UpstreamRequest::MarketSummary => {
                "/uapi/domestic-stock/v1/quotations/inquire-market-summary"
            }
            UpstreamRequest::SectorIndices { .. } => {
                "/uapi/domestic-stock/v1/quotations/inquire-sector-data"
            }
        }
    }

    /// Provider transaction id sent in the `tr_id` header.
    pub fn tr_id(&self) -> &'static str {
        match self {
            UpstreamRequest::IndexPrice { .. } => "FHKUP03500100",
            UpstreamRequest::IndexChart { .. } => "FHKUP03500200",
            UpstreamRequest::MarketSummary => "FHKUP03500300",
            UpstreamRequest::SectorIndices { .. } => "FHKUP03500400",
        }
    }

    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("FID_COND_MRKT_DIV_CODE", "U".to_string())];
        match self {
            UpstreamRequest::IndexPrice { market } | UpstreamRequest::SectorIndices { market } => {
                params.push(("FID_INPUT_ISCD", market.code().to_string()));
            }
            UpstreamRequest::IndexChart { market, period } => {
                params.push(("FID_INPUT_ISCD", market.code().to_string()));
                params.push(("FID_PERIOD_DIV_CODE", period.code().to_string()));
                params.push(("FID_INPUT_DATE_1", String::new()));
            }
            UpstreamRequest::MarketSummary => {}
        }
        params
    }
}

// == Upstream Client ==
/// Source of raw provider payloads.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn fetch(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_keys_are_deterministic() {
        let kospi = UpstreamRequest::IndexPrice {
            market: Market::Kospi,
        };
        assert_eq!(kospi.cache_key(), "index_price:0001");
        assert_eq!(kospi.cache_key(), kospi.clone().cache_key());

        let chart = UpstreamRequest::IndexChart {
            market: Market::Kospi,
            period: ChartPeriod::OneDay,
        };
        assert_eq!(chart.cache_key(), "index_chart:0001:D");
        assert_eq!(UpstreamRequest::MarketSummary.cache_key(), "market_summary");
        assert_eq!(
            UpstreamRequest::SectorIndices {
                market: Market::Kosdaq
            }
            .cache_key(),
            "sector_indices:1001"
        );
    }

    #[test]
    fn test_periods_sharing_a_code_share_a_key() {
        let month = UpstreamRequest::IndexChart {
            market: Market::Kosdaq,
            period: ChartPeriod::OneMonth,
        };
        let quarter = UpstreamRequest::IndexChart {
            market: Market::Kosdaq,
            period: ChartPeriod::ThreeMonths,
        };
        assert_eq!(month.cache_key(), quarter.cache_key());
    }

    #[test]
    fn test_categories() {
        let quote = UpstreamRequest::IndexPrice {
            market: Market::Kosdaq,
        };
        assert_eq!(quote.category(), DataCategory::Quote);
        assert_eq!(UpstreamRequest::MarketSummary.category(), DataCategory::Summary);
        assert_eq!(
            UpstreamRequest::SectorIndices {
                market: Market::Kospi
            }
            .category(),
            DataCategory::Summary
        );
    }

    #[test]
    fn test_chart_params() {
        let chart = UpstreamRequest::IndexChart {
            market: Market::Kosdaq,
            period: ChartPeriod::OneWeek,
        };
        let params = chart.params();
        assert!(params.contains(&("FID_INPUT_ISCD", "1001".to_string())));
        assert!(params.contains(&("FID_PERIOD_DIV_CODE", "W".to_string())));
        assert_eq!(chart.tr_id(), "FHKUP03500200");
        assert_eq!(UpstreamRequest::MarketSummary.params().len(), 1);
    }
}

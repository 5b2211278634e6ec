//! Request DTOs for the market data API
//!
//! Query-string parameters and their validation into typed requests.

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{ChartInterval, ChartPeriod, Market, MarketSelection};

/// Query for `GET /index`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexQuery {
    /// KOSPI, KOSDAQ or ALL (default ALL)
    #[serde(default)]
    pub market: Option<String>,
}

impl IndexQuery {
    pub fn validate(&self) -> Result<MarketSelection> {
        match self.market.as_deref() {
            None => Ok(MarketSelection::All),
            Some(market) => market.parse(),
        }
    }
}

/// Query for `GET /chart`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartQuery {
    #[serde(default)]
    pub market: Option<String>,
    /// 1D, 1W, 1M, 3M or 1Y (default 1D)
    #[serde(default)]
    pub period: Option<String>,
    /// 1m, 5m, 30m, 1h or 1d (default 5m)
    #[serde(default)]
    pub interval: Option<String>,
}

/// Validated chart query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartRequest {
    pub market: Market,
    pub period: ChartPeriod,
    pub interval: ChartInterval,
}

impl ChartQuery {
    pub fn validate(&self) -> Result<ChartRequest> {
        let market: Market = self
            .market
            .as_deref()
            .ok_or_else(|| AppError::InvalidRequest("market is required".to_string()))?
            .parse()?;
        let period: ChartPeriod = match self.period.as_deref() {
            Some(period) => period.parse()?,
            None => ChartPeriod::OneDay,
        };
        let interval: ChartInterval = match self.interval.as_deref() {
            Some(interval) => interval.parse()?,
            None => ChartInterval::FiveMinutes,
        };

        Ok(ChartRequest {
            market,
            period,
            interval,
        })
    }
}

/// Query for `GET /sectors`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectorQuery {
    /// KOSPI or KOSDAQ (default KOSPI)
    #[serde(default)]
    pub market: Option<String>,
}

impl SectorQuery {
    pub fn validate(&self) -> Result<Market> {
        match self.market.as_deref() {
            None => Ok(Market::Kospi),
            Some(market) => market.parse(),
        }
    }
}

//! Request and Response models for the market data API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! query parameters and HTTP response bodies.

pub mod market;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use market::{ChartInterval, ChartPeriod, Market, MarketSelection};
pub use requests::{ChartQuery, ChartRequest, IndexQuery, SectorQuery};
pub use responses::{
    ChartPoint, ChartResponse, ErrorResponse, HealthResponse, IndexQuote, InvalidateResponse,
    MarketFailure, MarketIndexResponse, MarketSummaryResponse, SectorQuote, SectorResponse,
    StatsResponse,
};

//! API Handlers
//!
//! HTTP request handlers for each endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::cache::{CacheStore, EntryInfo};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    ChartQuery, ChartResponse, HealthResponse, IndexQuery, InvalidateResponse,
    MarketIndexResponse, MarketSummaryResponse, SectorQuery, SectorResponse, StatsResponse,
};
use crate::retry::RetryExecutor;
use crate::tools::MarketTools;
use crate::upstream::UpstreamClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub tools: MarketTools,
}

impl AppState {
    pub fn new(tools: MarketTools) -> Self {
        Self { tools }
    }

    /// Builds the cache and query tools from configuration.
    pub fn from_config(config: &Config, upstream: Arc<dyn UpstreamClient>) -> Self {
        let cache = Arc::new(CacheStore::new(
            config.max_entries,
            RetryExecutor::new(config.retry.clone()),
        ));
        Self::new(MarketTools::new(
            cache,
            upstream,
            config.ttls,
            config.request_deadline,
        ))
    }

    pub fn cache(&self) -> &Arc<CacheStore<Value>> {
        self.tools.cache()
    }
}

/// Handler for GET /index
pub async fn index_handler(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<Json<MarketIndexResponse>> {
    let selection = query.validate()?;
    Ok(Json(state.tools.index(selection).await?))
}

/// Handler for GET /chart
pub async fn chart_handler(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<Json<ChartResponse>> {
    let request = query.validate()?;
    Ok(Json(state.tools.chart(request).await?))
}

/// Handler for GET /summary
pub async fn summary_handler(State(state): State<AppState>) -> Result<Json<MarketSummaryResponse>> {
    Ok(Json(state.tools.summary().await?))
}

/// Handler for GET /sectors
pub async fn sectors_handler(
    State(state): State<AppState>,
    Query(query): Query<SectorQuery>,
) -> Result<Json<SectorResponse>> {
    let market = query.validate()?;
    Ok(Json(state.tools.sectors(market).await?))
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache();
    Json(StatsResponse::new(
        cache.stats(),
        cache.max_entries(),
        cache.retry_metrics(),
    ))
}

/// Handler for GET /cache/entries/:key
pub async fn entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<EntryInfo>> {
    state
        .cache()
        .info(&key)
        .map(Json)
        .ok_or(AppError::NotFound(key))
}

/// Handler for DELETE /cache/entries/:key
pub async fn invalidate_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    match state.cache().invalidate(Some(&key)) {
        0 => Err(AppError::NotFound(key)),
        removed => Ok(Json(InvalidateResponse::key(&key, removed))),
    }
}

/// Handler for DELETE /cache
pub async fn invalidate_all_handler(State(state): State<AppState>) -> Json<InvalidateResponse> {
    Json(InvalidateResponse::all(state.cache().invalidate(None)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

//! Query Tools Module
//!
//! Thin shims between the HTTP surface and the cache: each builds an
//! [`UpstreamRequest`], reads it through [`CacheStore::get_or_fetch_until`]
//! and shapes the raw payload into a response model.

mod index;
mod market;
mod parse;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::cache::CacheStore;
use crate::config::CacheTtls;
use crate::error::Result;
use crate::upstream::{UpstreamClient, UpstreamRequest};

// == Market Tools ==
/// Cached access to the provider's market data.
#[derive(Clone)]
pub struct MarketTools {
    cache: Arc<CacheStore<Value>>,
    upstream: Arc<dyn UpstreamClient>,
    ttls: CacheTtls,
    deadline: Option<Duration>,
}

impl MarketTools {
    pub fn new(
        cache: Arc<CacheStore<Value>>,
        upstream: Arc<dyn UpstreamClient>,
        ttls: CacheTtls,
        deadline: Option<Duration>,
    ) -> Self {
        Self {
            cache,
            upstream,
            ttls,
            deadline,
        }
    }

    pub fn cache(&self) -> &Arc<CacheStore<Value>> {
        &self.cache
    }

    /// Reads `request` through the cache. Returns the payload and whether it
    /// was already fresh before this call.
    async fn fetch(&self, request: &UpstreamRequest) -> Result<(Value, bool)> {
        let key = request.cache_key();
        let cached = self.cache.get(&key).is_some();
        let ttl = self.ttls.for_category(request.category());
        let deadline = self.deadline.map(|d| Instant::now() + d);

        let value = self
            .cache
            .get_or_fetch_until(&key, ttl, deadline, || self.upstream.fetch(request))
            .await?;

        Ok((value, cached))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted upstream shared by the tool and handler tests.

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::error::UpstreamError;
    use crate::models::Market;
    use crate::upstream::{UpstreamClient, UpstreamRequest};

    /// Answers from canned payloads; queued errors are returned first.
    #[derive(Default)]
    pub struct ScriptedUpstream {
        pub calls: AtomicUsize,
        failures: Mutex<VecDeque<UpstreamError>>,
        failing_markets: Mutex<Vec<Market>>,
    }

    impl ScriptedUpstream {
        pub fn fail_next(&self, err: UpstreamError) {
            self.failures.lock().unwrap().push_back(err);
        }

        pub fn fail_market(&self, market: Market) {
            self.failing_markets.lock().unwrap().push(market);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UpstreamClient for ScriptedUpstream {
        async fn fetch(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.failures.lock().unwrap().pop_front() {
                return Err(err);
            }
            if let UpstreamRequest::IndexPrice { market } = request {
                if self.failing_markets.lock().unwrap().contains(market) {
                    return Err(UpstreamError::Fatal(format!("{market} unavailable")));
                }
            }
            Ok(payload(request))
        }
    }

    pub fn payload(request: &UpstreamRequest) -> Value {
        match request {
            UpstreamRequest::IndexPrice { market: Market::Kospi } => json!({
                "rt_cd": "0",
                "output": {
                    "bstp_nmix_prpr": "2500.50", "bstp_nmix_prdy_vrss": "12.30",
                    "bstp_nmix_prdy_ctrt": "0.49", "acml_vol": "450000000",
                    "acml_tr_pbmn": "8500000", "bstp_nmix_hgpr": "2510.00",
                    "bstp_nmix_lwpr": "2488.10", "bstp_nmix_oprc": "2490.00"
                }
            }),
            UpstreamRequest::IndexPrice { market: Market::Kosdaq } => json!({
                "rt_cd": "0",
                "output": {
                    "bstp_nmix_prpr": "850.25", "bstp_nmix_prdy_vrss": "-3.10",
                    "bstp_nmix_prdy_ctrt": "-0.36", "acml_vol": 900000000,
                    "acml_tr_pbmn": "6100000", "bstp_nmix_hgpr": "855.00",
                    "bstp_nmix_lwpr": "848.00", "bstp_nmix_oprc": "853.00"
                }
            }),
            UpstreamRequest::IndexChart { .. } => json!({
                "rt_cd": "0",
                "output2": [
                    {"stck_bsop_date": "20240116", "stck_oprc": "2490", "stck_hgpr": "2510",
                     "stck_lwpr": "2480", "stck_clpr": "2500.5", "acml_vol": "450000000"},
                    {"stck_bsop_date": "20240115", "stck_oprc": "2470", "stck_hgpr": "2495",
                     "stck_lwpr": "2465", "stck_clpr": "2488.2", "acml_vol": "410000000"}
                ]
            }),
            UpstreamRequest::MarketSummary => json!({
                "rt_cd": "0",
                "output": {
                    "up_cnt": "512", "down_cnt": "340", "unch_cnt": "88", "stop_cnt": "2",
                    "uplmt_cnt": "3", "dnlmt_cnt": "1", "new_high_cnt": "25",
                    "new_low_cnt": "9", "tot_askp_rsqn": "2100000000", "forn_hold_rsqn": "650000000"
                }
            }),
            UpstreamRequest::SectorIndices { .. } => json!({
                "rt_cd": "0",
                "output": [
                    {"updn_issu_name": "전기전자", "bstp_cls_code": "0013", "bstp_nmix_prpr": "25123.4",
                     "prdy_vrss": "120.5", "prdy_ctrt": "0.48", "acml_vol": "12000000", "acml_tr_pbmn": "950000"},
                    {"updn_issu_name": "화학", "bstp_cls_code": "0008", "bstp_nmix_prpr": "5120.1",
                     "prdy_vrss": "-20.3", "prdy_ctrt": "-0.39", "acml_vol": "3000000", "acml_tr_pbmn": "210000"}
                ]
            }),
        }
    }
}

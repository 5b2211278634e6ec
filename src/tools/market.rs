//! Market-wide summary and sector queries.

use serde_json::Value;

use super::parse::{integer, number, output, rows, text};
use super::MarketTools;
use crate::error::Result;
use crate::models::{Market, MarketSummaryResponse, SectorQuote, SectorResponse};
use crate::upstream::UpstreamRequest;

impl MarketTools {
    // == Summary ==
    /// Advance/decline breadth and market-wide totals.
    pub async fn summary(&self) -> Result<MarketSummaryResponse> {
        let (body, cached) = self.fetch(&UpstreamRequest::MarketSummary).await?;
        Ok(parse_summary(&body, cached))
    }

    // == Sectors ==
    pub async fn sectors(&self, market: Market) -> Result<SectorResponse> {
        let (body, cached) = self.fetch(&UpstreamRequest::SectorIndices { market }).await?;

        Ok(SectorResponse {
            timestamp: chrono::Utc::now().to_rfc3339(),
            market,
            sectors: parse_sectors(&body),
            cached,
        })
    }
}

fn parse_summary(body: &Value, cached: bool) -> MarketSummaryResponse {
    let out = output(body);
    MarketSummaryResponse {
        timestamp: chrono::Utc::now().to_rfc3339(),
        advancing: integer(out, "up_cnt"),
        declining: integer(out, "down_cnt"),
        unchanged: integer(out, "unch_cnt"),
        suspended: integer(out, "stop_cnt"),
        upper_limit: integer(out, "uplmt_cnt"),
        lower_limit: integer(out, "dnlmt_cnt"),
        new_highs: integer(out, "new_high_cnt"),
        new_lows: integer(out, "new_low_cnt"),
        market_cap: integer(out, "tot_askp_rsqn"),
        foreign_holdings: integer(out, "forn_hold_rsqn"),
        cached,
    }
}

fn parse_sectors(body: &Value) -> Vec<SectorQuote> {
    rows(body, "output")
        .iter()
        .map(|row| SectorQuote {
            name: text(row, "updn_issu_name"),
            code: text(row, "bstp_cls_code"),
            current: number(row, "bstp_nmix_prpr"),
            change: number(row, "prdy_vrss"),
            change_rate: number(row, "prdy_ctrt"),
            volume: integer(row, "acml_vol"),
            trading_value: integer(row, "acml_tr_pbmn"),
        })
        .collect()
}

//! Index quote and chart queries.

use serde_json::Value;
use tracing::warn;

use super::parse::{integer, number, output, rows, text, trading_day_timestamp};
use super::MarketTools;
use crate::error::Result;
use crate::models::{
    ChartPoint, ChartRequest, ChartResponse, IndexQuote, Market, MarketFailure,
    MarketIndexResponse, MarketSelection,
};
use crate::upstream::UpstreamRequest;

impl MarketTools {
    // == Index ==
    /// Current index values. With `All`, both markets are fetched concurrently
    /// and the call only fails if every market failed.
    pub async fn index(&self, selection: MarketSelection) -> Result<MarketIndexResponse> {
        let results = match selection {
            MarketSelection::One(market) => vec![(market, self.quote(market).await)],
            MarketSelection::All => {
                let (kospi, kosdaq) =
                    tokio::join!(self.quote(Market::Kospi), self.quote(Market::Kosdaq));
                vec![(Market::Kospi, kospi), (Market::Kosdaq, kosdaq)]
            }
        };

        let mut indices = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        let mut first_error = None;

        for (market, result) in results {
            match result {
                Ok(quote) => indices.push(quote),
                Err(err) => {
                    warn!(market = %market, error = %err, "index query failed");
                    errors.push(MarketFailure {
                        market,
                        error: err.to_string(),
                    });
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        match first_error {
            Some(err) if indices.is_empty() => Err(err),
            _ => Ok(MarketIndexResponse::new(indices, errors)),
        }
    }

    async fn quote(&self, market: Market) -> Result<IndexQuote> {
        let (body, cached) = self.fetch(&UpstreamRequest::IndexPrice { market }).await?;
        Ok(parse_quote(market, &body, cached))
    }

    // == Chart ==
    /// OHLCV bars for one market, oldest first.
    pub async fn chart(&self, request: ChartRequest) -> Result<ChartResponse> {
        let upstream = UpstreamRequest::IndexChart {
            market: request.market,
            period: request.period,
        };
        let (body, cached) = self.fetch(&upstream).await?;
        let points = parse_chart(&body);

        Ok(ChartResponse {
            market: request.market,
            period: request.period.as_str(),
            interval: request.interval.as_str(),
            data_points: points.len(),
            points,
            cached,
        })
    }
}

fn parse_quote(market: Market, body: &Value, cached: bool) -> IndexQuote {
    let out = output(body);
    IndexQuote {
        market,
        code: market.code(),
        current: number(out, "bstp_nmix_prpr"),
        change: number(out, "bstp_nmix_prdy_vrss"),
        change_rate: number(out, "bstp_nmix_prdy_ctrt"),
        volume: integer(out, "acml_vol"),
        trading_value: integer(out, "acml_tr_pbmn"),
        high: number(out, "bstp_nmix_hgpr"),
        low: number(out, "bstp_nmix_lwpr"),
        open: number(out, "bstp_nmix_oprc"),
        cached,
    }
}

fn parse_chart(body: &Value) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = rows(body, "output2")
        .iter()
        .map(|row| ChartPoint {
            timestamp: trading_day_timestamp(&text(row, "stck_bsop_date")),
            open: number(row, "stck_oprc"),
            high: number(row, "stck_hgpr"),
            low: number(row, "stck_lwpr"),
            close: number(row, "stck_clpr"),
            volume: integer(row, "acml_vol"),
        })
        .collect();

    points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    points
}

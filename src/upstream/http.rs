//! HTTP client for the Korea Investment open API.
//!
//! Maps every failure onto the [`UpstreamError`] taxonomy so the retry
//! executor can decide whether another attempt is worth it.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use super::{UpstreamClient, UpstreamRequest};
use crate::config::UpstreamConfig;
use crate::error::UpstreamError;

/// Provider business code for "too many requests per second".
const THROTTLED_MSG_CODE: &str = "EGW00201";

// == Http Upstream ==
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl HttpUpstream {
    pub fn new(config: UpstreamConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("market_cache/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, config }
    }

    fn url(&self, request: &UpstreamRequest) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            request.path()
        )
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn fetch(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        let mut builder = self
            .client
            .get(self.url(request))
            .header("content-type", "application/json; charset=utf-8")
            .header("appkey", &self.config.app_key)
            .header("appsecret", &self.config.app_secret)
            .header("tr_id", request.tr_id())
            .query(&request.params());

        if let Some(token) = &self.config.access_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(classify_transport)?;
        let status = response.status();
        debug!(status = status.as_u16(), tr_id = request.tr_id(), "upstream responded");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Fatal(format!("undecodable response body: {e}")))?;

        check_business_code(body)
    }
}

// == Classification ==
fn classify_transport(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::TransientNetwork(format!("request timeout: {err}"))
    } else if err.is_connect() {
        UpstreamError::TransientNetwork(format!("connection failed: {err}"))
    } else if err.is_request() || err.is_body() {
        UpstreamError::TransientNetwork(format!("request failed: {err}"))
    } else {
        UpstreamError::Fatal(format!("request could not be built: {err}"))
    }
}

/// Classifies a non-2xx response.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> UpstreamError {
    let detail = if body.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("HTTP {}: {}", status.as_u16(), truncate(body, 200))
    };

    if status == StatusCode::TOO_MANY_REQUESTS {
        UpstreamError::RateLimit(detail)
    } else if status == StatusCode::REQUEST_TIMEOUT || status.is_server_error() {
        UpstreamError::TransientNetwork(detail)
    } else {
        UpstreamError::Fatal(detail)
    }
}

/// Rejects bodies whose `rt_cd` is not `"0"`.
pub(crate) fn check_business_code(body: Value) -> Result<Value, UpstreamError> {
    let rt_cd = body.get("rt_cd").and_then(Value::as_str).unwrap_or("0");
    if rt_cd == "0" {
        return Ok(body);
    }

    let msg_cd = body.get("msg_cd").and_then(Value::as_str).unwrap_or_default();
    let msg = body.get("msg1").and_then(Value::as_str).unwrap_or_default();
    let detail = format!("rt_cd={rt_cd} msg_cd={msg_cd} {}", msg.trim());

    if msg_cd == THROTTLED_MSG_CODE {
        Err(UpstreamError::RateLimit(detail))
    } else {
        Err(UpstreamError::Fatal(detail))
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

//! Error types for the market data cache
//!
//! Provides unified error handling using thiserror.

use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::retry::{Classify, ErrorKind};

// == Upstream Error Enum ==
/// Failure reported by an upstream call, tagged by remedy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Caller input the upstream can never satisfy
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network-level or server-side failure that may succeed on retry
    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    /// Provider quota exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Request rejected after inspecting the upstream response
    #[error("Upstream rejected request: {0}")]
    Fatal(String),
}

impl Classify for UpstreamError {
    fn kind(&self) -> ErrorKind {
        match self {
            UpstreamError::TransientNetwork(_) => ErrorKind::Transient,
            UpstreamError::RateLimit(_) => ErrorKind::RateLimited,
            UpstreamError::Validation(_) | UpstreamError::Fatal(_) => ErrorKind::Fatal,
        }
    }
}

// == Fetch Error Enum ==
/// Terminal outcome of a failed get-or-fetch.
#[derive(Error, Debug)]
pub enum FetchError<E: StdError + 'static> {
    /// The last upstream error once retries stopped
    #[error("{error} ({kind}, after {attempts} attempt(s))")]
    Upstream {
        #[source]
        error: E,
        attempts: u32,
        kind: ErrorKind,
    },

    /// The per-call deadline passed while waiting for the key, calling upstream, or backing off
    #[error("Deadline exceeded after {attempts} attempt(s)")]
    Timeout { attempts: u32 },
}

impl<E: StdError + 'static> FetchError<E> {
    /// Number of upstream attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            FetchError::Upstream { attempts, .. } | FetchError::Timeout { attempts } => *attempts,
        }
    }

    /// Terminal classification, `None` for timeouts.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            FetchError::Upstream { kind, .. } => Some(*kind),
            FetchError::Timeout { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }

    /// The upstream error, if the failure was not a timeout.
    pub fn upstream(&self) -> Option<&E> {
        match self {
            FetchError::Upstream { error, .. } => Some(error),
            FetchError::Timeout { .. } => None,
        }
    }
}

// == App Error Enum ==
/// Error type returned by the HTTP handlers and query tools.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Cache key not present
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Upstream fetch failed
    #[error(transparent)]
    Fetch(#[from] FetchError<UpstreamError>),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Fetch(FetchError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Fetch(FetchError::Upstream { error, .. }) => match error {
                UpstreamError::Validation(_) => StatusCode::BAD_REQUEST,
                UpstreamError::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
                UpstreamError::TransientNetwork(_) => StatusCode::SERVICE_UNAVAILABLE,
                UpstreamError::Fatal(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Fetch(err) => ErrorResponse::upstream(
                err.to_string(),
                err.kind().map(ErrorKind::as_str).unwrap_or("timeout"),
                err.attempts(),
            ),
            _ => ErrorResponse::new(self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the query layer.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_classification() {
        assert_eq!(
            UpstreamError::TransientNetwork("reset".into()).kind(),
            ErrorKind::Transient
        );
        assert_eq!(
            UpstreamError::RateLimit("429".into()).kind(),
            ErrorKind::RateLimited
        );
        assert_eq!(UpstreamError::Fatal("bad".into()).kind(), ErrorKind::Fatal);
        assert_eq!(
            UpstreamError::Validation("market".into()).kind(),
            ErrorKind::Fatal
        );
    }

    #[test]
    fn test_fetch_error_accessors() {
        let err = FetchError::Upstream {
            error: UpstreamError::RateLimit("quota".into()),
            attempts: 3,
            kind: ErrorKind::RateLimited,
        };
        assert_eq!(err.attempts(), 3);
        assert_eq!(err.kind(), Some(ErrorKind::RateLimited));
        assert!(!err.is_timeout());
        assert!(err.to_string().contains("after 3 attempt(s)"));

        let timeout: FetchError<UpstreamError> = FetchError::Timeout { attempts: 0 };
        assert!(timeout.is_timeout());
        assert!(timeout.kind().is_none());
        assert!(timeout.upstream().is_none());
    }

    #[test]
    fn test_app_error_status_mapping() {
        let upstream = |error: UpstreamError| {
            let kind = error.kind();
            AppError::Fetch(FetchError::Upstream {
                error,
                attempts: 1,
                kind,
            })
        };

        assert_eq!(
            AppError::InvalidRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::NotFound("k".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            upstream(UpstreamError::RateLimit("q".into())).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            upstream(UpstreamError::TransientNetwork("t".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            upstream(UpstreamError::Fatal("f".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Fetch(FetchError::Timeout { attempts: 1 }).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}

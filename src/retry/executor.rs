//! Retry Executor Module
//!
//! Runs a fetch operation under a [`RetryPolicy`], classifying each failure.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, error, warn};

use super::RetryPolicy;
use crate::error::FetchError;

// == Error Kind ==
/// Classification of a failed upstream attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Retryable with geometric backoff
    Transient,
    /// Retryable after the fixed rate-limit delay
    RateLimited,
    /// Never retried
    Fatal,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::RateLimited => "rate_limited",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_retryable(self) -> bool {
        !matches!(self, Self::Fatal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Classify ==
/// Errors that can be tagged with an [`ErrorKind`].
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

// == Retry Metrics ==
/// Attempt counters shared by every clone of an executor.
#[derive(Debug, Default)]
pub struct RetryMetrics {
    total_attempts: AtomicU64,
    total_retries: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
}

/// Point-in-time copy of [`RetryMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RetryMetricsSnapshot {
    pub total_attempts: u64,
    pub total_retries: u64,
    pub success_count: u64,
    pub failure_count: u64,
    /// successes / attempts, or 0.0 before the first attempt
    pub success_rate: f64,
}

impl RetryMetrics {
    fn record_attempt(&self) {
        self.total_attempts.fetch_add(1, Ordering::Relaxed);
    }

    fn record_retry(&self) {
        self.total_retries.fetch_add(1, Ordering::Relaxed);
    }

    fn record_success(&self) {
        self.success_count.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RetryMetricsSnapshot {
        let total_attempts = self.total_attempts.load(Ordering::Relaxed);
        let success_count = self.success_count.load(Ordering::Relaxed);
        let success_rate = if total_attempts == 0 {
            0.0
        } else {
            success_count as f64 / total_attempts as f64
        };

        RetryMetricsSnapshot {
            total_attempts,
            total_retries: self.total_retries.load(Ordering::Relaxed),
            success_count,
            failure_count: self.failure_count.load(Ordering::Relaxed),
            success_rate,
        }
    }
}

// == Retry Executor ==
/// Runs operations under a retry policy.
///
/// Cloning is cheap; clones share the same metrics.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    metrics: Arc<RetryMetrics>,
}

impl RetryExecutor {
    // == Constructor ==
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            metrics: Arc::new(RetryMetrics::default()),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn metrics(&self) -> RetryMetricsSnapshot {
        self.metrics.snapshot()
    }

    // == Execute ==
    /// Runs `operation` until it succeeds, fails fatally, or the attempt budget is spent.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, FetchError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + std::error::Error + 'static,
    {
        self.execute_until(None, operation).await
    }

    /// Like [`RetryExecutor::execute`], bounded by an optional deadline.
    ///
    /// The deadline covers each upstream call and each retry delay. A delay that
    /// would end past the deadline is not slept; the call fails with
    /// [`FetchError::Timeout`] straight away.
    pub async fn execute_until<T, E, F, Fut>(
        &self,
        deadline: Option<Instant>,
        mut operation: F,
    ) -> Result<T, FetchError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + std::error::Error + 'static,
    {
        let max_attempts = self.policy.attempts();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.metrics.record_attempt();

            let outcome = match deadline {
                Some(deadline) => match timeout_at(deadline, operation()).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        self.metrics.record_failure();
                        warn!(attempt, max_attempts, "upstream call exceeded deadline");
                        return Err(FetchError::Timeout { attempts: attempt });
                    }
                },
                None => operation().await,
            };

            let err = match outcome {
                Ok(value) => {
                    self.metrics.record_success();
                    debug!(attempt, max_attempts, "upstream call succeeded");
                    return Ok(value);
                }
                Err(err) => err,
            };

            self.metrics.record_failure();
            let kind = err.kind();

            if !kind.is_retryable() {
                warn!(
                    attempt,
                    max_attempts,
                    kind = %kind,
                    delay_ms = 0u64,
                    error = %err,
                    "upstream call failed, not retrying"
                );
                return Err(FetchError::Upstream {
                    error: err,
                    attempts: attempt,
                    kind,
                });
            }

            if attempt >= max_attempts {
                error!(
                    attempt,
                    max_attempts,
                    kind = %kind,
                    delay_ms = 0u64,
                    error = %err,
                    "all upstream attempts failed"
                );
                return Err(FetchError::Upstream {
                    error: err,
                    attempts: attempt,
                    kind,
                });
            }

            let delay = self.policy.delay_for(kind, attempt);
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            warn!(
                attempt,
                max_attempts,
                kind = %kind,
                delay_ms,
                error = %err,
                "upstream call failed, retrying"
            );

            if let Some(deadline) = deadline {
                let overruns = Instant::now()
                    .checked_add(delay)
                    .map_or(true, |wake| wake > deadline);
                if overruns {
                    warn!(attempt, delay_ms, "retry delay would overrun deadline");
                    return Err(FetchError::Timeout { attempts: attempt });
                }
            }

            self.metrics.record_retry();
            sleep(delay).await;
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

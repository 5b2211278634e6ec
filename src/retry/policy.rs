//! Retry Policy Module
//!
//! Backoff configuration and delay schedule.

use std::time::Duration;

use super::executor::ErrorKind;

// == Retry Policy ==
/// Backoff configuration applied by the retry executor.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first one (at least 1)
    pub max_attempts: u32,
    /// Delay before the first transient retry
    pub base_delay: Duration,
    /// Growth factor applied per transient retry
    pub backoff_multiplier: f64,
    /// Fixed delay used whenever the failure is a rate limit
    pub rate_limit_delay: Duration,
    /// Upper bound on the geometric schedule
    pub max_delay: Duration,
}

impl RetryPolicy {
    // == Constructor ==
    /// Creates a policy with the given attempt budget and schedule.
    ///
    /// `max_delay` defaults to 60 seconds; use [`RetryPolicy::with_max_delay`] to change it.
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        backoff_multiplier: f64,
        rate_limit_delay: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            backoff_multiplier,
            rate_limit_delay,
            max_delay: Duration::from_secs(60),
        }
    }

    /// Replaces the cap on the geometric schedule.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Policy that never retries.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, 1.0, Duration::ZERO)
    }

    /// Attempt budget, never below one.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    // == Delay Schedule ==
    /// Returns the delay to wait after a failure of `kind` on attempt `attempt` (1-based).
    ///
    /// - `RateLimited`: always `rate_limit_delay`, regardless of attempt index
    /// - `Transient`: `base_delay * backoff_multiplier^(attempt - 1)`, capped at `max_delay`
    /// - `Fatal`: zero, fatal failures are never retried
    pub fn delay_for(&self, kind: ErrorKind, attempt: u32) -> Duration {
        match kind {
            ErrorKind::RateLimited => self.rate_limit_delay,
            ErrorKind::Fatal => Duration::ZERO,
            ErrorKind::Transient => {
                let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
                let scale = self.backoff_multiplier.max(0.0).powi(exponent);
                let seconds = self.base_delay.as_secs_f64() * scale;

                Duration::try_from_secs_f64(seconds)
                    .unwrap_or(self.max_delay)
                    .min(self.max_delay)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), 2.0, Duration::from_secs(60))
    }
}

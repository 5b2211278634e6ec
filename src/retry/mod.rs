//! Retry Module
//!
//! Runs upstream operations under a classified retry/backoff policy.
//!
//! Failures are sorted into three kinds: transient failures back off
//! geometrically, rate-limit failures wait out a fixed quota window, and
//! fatal failures surface immediately.

mod executor;
mod policy;

pub use executor::{Classify, ErrorKind, RetryExecutor, RetryMetrics, RetryMetricsSnapshot};
pub use policy::RetryPolicy;

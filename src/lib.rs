//! Market Cache - cached, retrying gateway to a market data provider
//!
//! A key-addressed TTL cache with single-flight fetches, a classified
//! retry/backoff executor, and an HTTP surface over Korean index data.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod retry;
pub mod tasks;
pub mod tools;
pub mod upstream;

pub use api::{create_router, AppState};
pub use cache::CacheStore;
pub use config::Config;
pub use error::{AppError, FetchError, UpstreamError};
pub use retry::{Classify, ErrorKind, RetryExecutor, RetryPolicy};
pub use tasks::spawn_cleanup_task;
pub use upstream::{HttpUpstream, UpstreamClient};

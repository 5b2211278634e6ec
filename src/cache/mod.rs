//! Cache Module
//!
//! Provides an in-memory TTL cache with single-flight fetches.

mod entry;
mod lock;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{CacheEntry, EntryInfo};
pub use lock::{CoalescingLock, KeyGuard};
pub use stats::{CacheCounters, CacheStats};
pub use store::CacheStore;

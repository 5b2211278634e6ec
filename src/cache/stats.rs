//! Cache Statistics Module
//!
//! Tracks cache performance counters and builds point-in-time snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Counters ==
/// Lock-free counters updated on the get-or-fetch path.
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
    evictions: AtomicU64,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh entry found without taking the key lock.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// No fresh entry; this caller ran the fetch.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Fresh entry found after waiting behind another caller's fetch.
    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evictions(&self, count: usize) {
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
    }
}

// == Cache Stats ==
/// Snapshot of the cache state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries currently stored, fresh or not
    pub total_keys: usize,
    /// Entries with `expires_at > now`
    pub valid_keys: usize,
    /// `total_keys - valid_keys`
    pub expired_keys: usize,
    /// Lookups served from a fresh entry without waiting
    pub hits: u64,
    /// Lookups that ran an upstream fetch
    pub misses: u64,
    /// Lookups served by another caller's fetch
    pub coalesced: u64,
    /// Entries removed to respect the capacity bound
    pub evictions: u64,
    /// Keys currently held or awaited
    pub in_flight_keys: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Builds a snapshot from entry counts and the running counters.
    pub fn snapshot(
        total_keys: usize,
        valid_keys: usize,
        in_flight_keys: usize,
        counters: &CacheCounters,
    ) -> Self {
        Self {
            total_keys,
            valid_keys,
            expired_keys: total_keys.saturating_sub(valid_keys),
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            coalesced: counters.coalesced.load(Ordering::Relaxed),
            evictions: counters.evictions.load(Ordering::Relaxed),
            in_flight_keys,
        }
    }

    // == Hit Rate ==
    /// Share of lookups answered without a fetch of their own.
    ///
    /// Returns (hits + coalesced) / (hits + coalesced + misses), or 0.0 if no lookups were made.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.coalesced;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }
}

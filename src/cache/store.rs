//! Cache Store Module
//!
//! TTL cache with single-flight fetches, backed by the retry executor.

use std::future::Future;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheCounters, CacheEntry, CacheStats, CoalescingLock, EntryInfo, KeyGuard};
use crate::error::FetchError;
use crate::retry::{Classify, RetryExecutor, RetryMetricsSnapshot};

// == Cache Store ==
/// Key-addressed TTL cache with request coalescing.
///
/// Entries and lock handles live in separate sharded maps. Reads, stats and
/// lock creation only touch a shard briefly and never wait on an in-flight
/// fetch; writes to an entry happen while holding that key's lock.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key to entry storage
    entries: DashMap<String, CacheEntry<V>>,
    /// Per-key fetch locks
    locks: CoalescingLock,
    /// Runs fetches under the retry policy
    retry: RetryExecutor,
    /// Performance counters
    counters: CacheCounters,
    /// Entry count above which the earliest-expiring entries are evicted
    max_entries: usize,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `max_entries` - Capacity bound (at least 1)
    /// * `retry` - Executor every fetch runs through
    pub fn new(max_entries: usize, retry: RetryExecutor) -> Self {
        Self {
            entries: DashMap::new(),
            locks: CoalescingLock::new(),
            retry,
            counters: CacheCounters::new(),
            max_entries: max_entries.max(1),
        }
    }

    // == Get ==
    /// Returns the value for `key` if an unexpired entry exists. Never fetches.
    pub fn get(&self, key: &str) -> Option<V> {
        self.fresh(key, Instant::now())
    }

    // == Get Or Fetch ==
    /// Returns the cached value for `key`, fetching it through the retry
    /// executor when missing or expired.
    ///
    /// Concurrent callers for the same key share one fetch. A failed fetch
    /// stores nothing and its error is returned unchanged.
    pub async fn get_or_fetch<E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<V, FetchError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Classify + std::error::Error + 'static,
    {
        self.get_or_fetch_until(key, ttl, None, fetch).await
    }

    /// Like [`CacheStore::get_or_fetch`], giving up at `deadline`.
    ///
    /// The deadline applies to waiting on the key lock, to each upstream call
    /// and to retry delays. Timing out never disturbs other waiters.
    pub async fn get_or_fetch_until<E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        deadline: Option<Instant>,
        fetch: F,
    ) -> Result<V, FetchError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Classify + std::error::Error + 'static,
    {
        if let Some(value) = self.fresh(key, Instant::now()) {
            self.counters.record_hit();
            debug!(key, "cache hit");
            return Ok(value);
        }

        let guard = match self.locks.acquire_until(key, deadline).await {
            Ok(guard) => guard,
            Err(_) => {
                debug!(key, "deadline passed while waiting for in-flight fetch");
                return Err(FetchError::Timeout { attempts: 0 });
            }
        };

        // Another caller may have refreshed the entry while we waited.
        if let Some(value) = self.fresh(key, Instant::now()) {
            self.counters.record_coalesced();
            debug!(key, "cache hit after waiting on in-flight fetch");
            return Ok(value);
        }

        self.counters.record_miss();
        debug!(key, ttl_ms = ttl.as_millis() as u64, "cache miss, fetching");

        let value = self.retry.execute_until(deadline, fetch).await?;
        self.store_locked(&guard, value.clone(), ttl);

        Ok(value)
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl`, replacing any previous entry
    /// unless that entry already outlives the new one.
    ///
    /// Waits for an in-flight fetch on the same key to finish first.
    /// Returns true if the value was stored.
    pub async fn set(&self, key: &str, value: V, ttl: Duration) -> bool {
        let guard = self.locks.acquire(key).await;
        let expires_at = Instant::now() + ttl;

        let outlived = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.expires_at > expires_at);
        if outlived {
            debug!(key, "kept existing entry with a later expiry");
            return false;
        }

        self.store_locked(&guard, value, ttl);
        true
    }

    // == Invalidate ==
    /// Removes the entry for `key`, or every entry when `key` is `None`.
    ///
    /// A fetch already in flight is not cancelled and will store its result.
    /// Returns the number of entries removed.
    pub fn invalidate(&self, key: Option<&str>) -> usize {
        let removed = match key {
            Some(key) => usize::from(self.entries.remove(key).is_some()),
            None => {
                let mut count = 0;
                self.entries.retain(|_, _| {
                    count += 1;
                    false
                });
                count
            }
        };

        debug!(key = key.unwrap_or("*"), removed, "cache invalidated");
        removed
    }

    // == Stats ==
    /// Returns a snapshot of entry counts and counters. No side effects.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let (total, valid) = self.entries.iter().fold((0, 0), |(total, valid), entry| {
            (total + 1, valid + usize::from(entry.is_fresh_at(now)))
        });

        CacheStats::snapshot(total, valid, self.locks.len(), &self.counters)
    }

    /// Attempt counters of the retry executor.
    pub fn retry_metrics(&self) -> RetryMetricsSnapshot {
        self.retry.metrics()
    }

    // == Entry Info ==
    /// Describes the entry for `key`, expired or not.
    pub fn info(&self, key: &str) -> Option<EntryInfo> {
        let now = Instant::now();
        self.entries.get(key).map(|entry| EntryInfo {
            key: key.to_string(),
            expires_at: entry.expires_at_utc(now),
            ttl_remaining_ms: entry.ttl_remaining_at(now).as_millis() as u64,
            is_expired: !entry.is_fresh_at(now),
        })
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        let removed = self.remove_expired(Instant::now());
        if removed > 0 {
            debug!(removed, "removed expired cache entries");
        }
        removed
    }

    // == Length ==
    /// Returns the number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keys with a live lock handle.
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    // == Internals ==
    fn fresh(&self, key: &str, now: Instant) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh_at(now))
            .map(|entry| entry.value.clone())
    }

    /// Replaces the entry for the key `guard` holds.
    fn store_locked(&self, guard: &KeyGuard<'_>, value: V, ttl: Duration) {
        let key = guard.key();
        let now = Instant::now();
        self.entries
            .insert(key.to_string(), CacheEntry::new(value, ttl, now));
        debug!(key, ttl_ms = ttl.as_millis() as u64, "cache entry stored");

        self.enforce_capacity(key, now);
    }

    /// Removes entries not fresh at `now`.
    ///
    /// Each removal re-checks the entry, so one refreshed in the meantime survives.
    fn remove_expired(&self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| !entry.is_fresh_at(now))
            .map(|entry| entry.key().clone())
            .collect();

        expired
            .iter()
            .filter(|key| {
                self.entries
                    .remove_if(key.as_str(), |_, entry| !entry.is_fresh_at(now))
                    .is_some()
            })
            .count()
    }

    /// Keeps the entry count within `max_entries`.
    ///
    /// Expired entries go first, then those expiring soonest. The entry just
    /// written is never a candidate.
    fn enforce_capacity(&self, just_written: &str, now: Instant) {
        if self.entries.len() <= self.max_entries {
            return;
        }

        self.remove_expired(now);
        let overflow = self.entries.len().saturating_sub(self.max_entries);
        if overflow == 0 {
            return;
        }

        let mut candidates: Vec<(String, Instant)> = self
            .entries
            .iter()
            .filter(|entry| entry.key() != just_written)
            .map(|entry| (entry.key().clone(), entry.expires_at))
            .collect();
        candidates.sort_by_key(|(_, expires_at)| *expires_at);

        let evicted = candidates
            .into_iter()
            .take(overflow)
            .filter(|(key, expires_at)| self.evict_if_unchanged(key, *expires_at))
            .count();

        self.counters.record_evictions(evicted);
        debug!(evicted, "evicted entries to respect capacity");
    }

    /// Removes `key` only if its entry still expires at `expires_at`.
    ///
    /// An entry replaced since it was picked as a candidate is left alone.
    fn evict_if_unchanged(&self, key: &str, expires_at: Instant) -> bool {
        self.entries
            .remove_if(key, |_, entry| entry.expires_at == expires_at)
            .is_some()
    }
}

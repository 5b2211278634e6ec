//! Cache Entry Module
//!
//! Defines the immutable record stored per cache key.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

// == Cache Entry ==
/// A fetched value and the instant it stops being fresh.
///
/// Entries are never mutated; a refresh builds a new entry and replaces the old one.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Absolute expiry; the entry is fresh strictly before this instant
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` after `now`.
    pub fn new(value: V, ttl: Duration, now: Instant) -> Self {
        Self {
            value,
            expires_at: now + ttl,
        }
    }

    // == Freshness ==
    /// Returns true while `now < expires_at`.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    // == Time To Live ==
    /// Remaining freshness at `now`, zero once expired.
    pub fn ttl_remaining_at(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }

    /// Wall-clock expiry, for display.
    pub fn expires_at_utc(&self, now: Instant) -> DateTime<Utc> {
        let wall_now = Utc::now();
        let offset = |d: Duration| chrono::Duration::from_std(d).unwrap_or(chrono::Duration::zero());

        if self.expires_at >= now {
            wall_now + offset(self.expires_at - now)
        } else {
            wall_now - offset(now - self.expires_at)
        }
    }
}

// == Entry Info ==
/// Read-only description of one stored entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryInfo {
    pub key: String,
    /// Wall-clock expiry (RFC 3339 when serialized)
    pub expires_at: DateTime<Utc>,
    pub ttl_remaining_ms: u64,
    pub is_expired: bool,
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_fresh_until_ttl_elapses() {
        let entry = CacheEntry::new("2500.50", Duration::from_secs(5), Instant::now());

        assert!(entry.is_fresh_at(Instant::now()));
        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(entry.is_fresh_at(Instant::now()));
        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(!entry.is_fresh_at(Instant::now()));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry::new((), Duration::from_secs(5), now);

        assert!(entry.is_fresh_at(now + Duration::from_millis(4_999)));
        assert!(!entry.is_fresh_at(now + Duration::from_secs(5)));
    }

    #[test]
    fn test_zero_ttl_is_never_fresh() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, Duration::ZERO, now);
        assert!(!entry.is_fresh_at(now));
    }

    #[test]
    fn test_ttl_remaining() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, Duration::from_secs(10), now);

        assert_eq!(
            entry.ttl_remaining_at(now + Duration::from_secs(4)),
            Duration::from_secs(6)
        );
        assert_eq!(
            entry.ttl_remaining_at(now + Duration::from_secs(11)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_expires_at_utc_is_in_the_future() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u32, Duration::from_secs(60), now);

        let expires = entry.expires_at_utc(now);
        assert!(expires > Utc::now() + chrono::Duration::seconds(50));
    }
}

//! Coalescing Lock Module
//!
//! Per-key mutual exclusion so at most one fetch per key is in flight.
//!
//! Lock handles live in a sharded map. A handle is created on first use and
//! removed once nobody holds or waits on it, so the table only tracks keys
//! that are currently busy.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::{error::Elapsed, timeout_at, Instant};

type Slot = Arc<Mutex<()>>;

// == Coalescing Lock ==
/// Table of per-key async locks.
#[derive(Debug, Default)]
pub struct CoalescingLock {
    slots: DashMap<String, Slot>,
}

/// Exclusive hold on one key. Releases on drop.
#[derive(Debug)]
pub struct KeyGuard<'a> {
    owner: &'a CoalescingLock,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl CoalescingLock {
    pub fn new() -> Self {
        Self::default()
    }

    // == Acquire ==
    /// Waits for exclusive access to `key`.
    pub async fn acquire(&self, key: &str) -> KeyGuard<'_> {
        let guard = self.slot(key).lock_owned().await;
        self.guard(key, guard)
    }

    /// Waits for exclusive access to `key`, giving up at `deadline`.
    ///
    /// A waiter that gives up leaves the lock untouched for the other waiters.
    pub async fn acquire_until(
        &self,
        key: &str,
        deadline: Option<Instant>,
    ) -> Result<KeyGuard<'_>, Elapsed> {
        let Some(deadline) = deadline else {
            return Ok(self.acquire(key).await);
        };

        match timeout_at(deadline, self.slot(key).lock_owned()).await {
            Ok(guard) => Ok(self.guard(key, guard)),
            Err(elapsed) => {
                self.prune(key);
                Err(elapsed)
            }
        }
    }

    // == Introspection ==
    /// Number of live lock handles (keys held or waited on).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // == Internals ==
    /// Clones the handle for `key`, creating it if absent.
    ///
    /// The clone happens under the shard lock, so `prune` can never observe a
    /// refcount of one while a caller is on its way to the mutex.
    fn slot(&self, key: &str) -> Slot {
        self.slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn guard(&self, key: &str, guard: OwnedMutexGuard<()>) -> KeyGuard<'_> {
        KeyGuard {
            owner: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Drops the handle for `key` if the table holds the only reference.
    fn prune(&self, key: &str) {
        self.slots
            .remove_if(key, |_, slot| Arc::strong_count(slot) == 1);
    }
}

impl KeyGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // Unlock first so the refcount reflects only the remaining waiters.
        drop(self.guard.take());
        self.owner.prune(&self.key);
    }
}

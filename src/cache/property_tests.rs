//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache invariants over generated operation sequences.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::task::JoinSet;

use crate::cache::CacheStore;
use crate::retry::{Classify, ErrorKind, RetryExecutor, RetryPolicy};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 1000;
const LONG_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
#[error("generated failure ({0})")]
struct GeneratedError(ErrorKind);

impl Classify for GeneratedError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

fn test_store(max_attempts: u32) -> CacheStore<String> {
    CacheStore::new(
        TEST_MAX_ENTRIES,
        RetryExecutor::new(RetryPolicy::new(
            max_attempts,
            Duration::from_millis(5),
            2.0,
            Duration::from_millis(20),
        )),
    )
}

// == Strategies ==
/// Keys shaped like the query layer's fingerprints, drawn from a small pool to force collisions
fn key_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "index_price:0001",
        "index_price:1001",
        "index_chart:0001:D",
        "market_summary",
        "sector_indices:0001",
    ])
    .prop_map(str::to_string)
}

fn kind_strategy() -> impl Strategy<Value = ErrorKind> {
    prop_oneof![
        Just(ErrorKind::Transient),
        Just(ErrorKind::RateLimited),
        Just(ErrorKind::Fatal),
    ]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Fetch { key: String, value: String },
    Peek { key: String },
    Invalidate { key: String },
    InvalidateAll,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), "[0-9]{1,6}").prop_map(|(key, value)| CacheOp::Fetch { key, value }),
        key_strategy().prop_map(|key| CacheOp::Peek { key }),
        key_strategy().prop_map(|key| CacheOp::Invalidate { key }),
        Just(CacheOp::InvalidateAll),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // With a TTL longer than the run, the store behaves like a map that is only
    // written on a miss; fetches happen exactly when the model has no value.
    #[test]
    fn prop_store_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let rt = runtime();
        rt.block_on(async {
            let store = test_store(1);
            let mut model: HashMap<String, String> = HashMap::new();
            let fetches = Arc::new(AtomicUsize::new(0));
            let mut expected_fetches = 0;

            for op in ops {
                match op {
                    CacheOp::Fetch { key, value } => {
                        let fetches = fetches.clone();
                        let fetched = value.clone();
                        let got = store
                            .get_or_fetch(&key, LONG_TTL, move || {
                                fetches.fetch_add(1, Ordering::SeqCst);
                                std::future::ready(Ok::<_, GeneratedError>(fetched.clone()))
                            })
                            .await
                            .unwrap();

                        if !model.contains_key(&key) {
                            expected_fetches += 1;
                            model.insert(key.clone(), value);
                        }
                        prop_assert_eq!(Some(&got), model.get(&key));
                    }
                    CacheOp::Peek { key } => {
                        let peeked = store.get(&key);
                        prop_assert_eq!(peeked.as_ref(), model.get(&key));
                    }
                    CacheOp::Invalidate { key } => {
                        let removed = store.invalidate(Some(&key));
                        prop_assert_eq!(removed, usize::from(model.remove(&key).is_some()));
                    }
                    CacheOp::InvalidateAll => {
                        prop_assert_eq!(store.invalidate(None), model.len());
                        model.clear();
                    }
                }

                let stats = store.stats();
                prop_assert_eq!(stats.total_keys, model.len());
                prop_assert_eq!(stats.valid_keys + stats.expired_keys, stats.total_keys);
            }

            prop_assert_eq!(fetches.load(Ordering::SeqCst), expected_fetches);
            prop_assert_eq!(store.lock_count(), 0);
            Ok::<(), TestCaseError>(())
        })?;
    }

    // Any number of concurrent callers on a cold key trigger exactly one fetch
    // and all observe the same value.
    #[test]
    fn prop_concurrent_callers_coalesce(callers in 1usize..32, key in key_strategy()) {
        let rt = runtime();
        rt.block_on(async {
            let store = Arc::new(test_store(3));
            let fetches = Arc::new(AtomicUsize::new(0));
            let mut set = JoinSet::new();

            for _ in 0..callers {
                let store = store.clone();
                let fetches = fetches.clone();
                let key = key.clone();
                set.spawn(async move {
                    store
                        .get_or_fetch(&key, LONG_TTL, move || {
                            let fetches = fetches.clone();
                            async move {
                                let n = fetches.fetch_add(1, Ordering::SeqCst);
                                tokio::time::sleep(Duration::from_millis(10)).await;
                                Ok::<_, GeneratedError>(format!("value-{n}"))
                            }
                        })
                        .await
                });
            }

            while let Some(joined) = set.join_next().await {
                let value = joined.unwrap().unwrap();
                prop_assert_eq!(value, "value-0");
            }

            prop_assert_eq!(fetches.load(Ordering::SeqCst), 1);
            Ok::<(), TestCaseError>(())
        })?;
    }

    // A fetch that never succeeds leaves nothing behind, whatever its kind,
    // and each call spends its own attempt budget.
    #[test]
    fn prop_failures_are_never_cached(
        kind in kind_strategy(),
        max_attempts in 1u32..5,
        key in key_strategy()
    ) {
        let rt = runtime();
        rt.block_on(async {
            let store = test_store(max_attempts);
            let expected = if kind == ErrorKind::Fatal { 1 } else { max_attempts };

            for round in 1..=2u32 {
                let calls = Arc::new(AtomicUsize::new(0));
                let counter = calls.clone();
                let err = store
                    .get_or_fetch(&key, LONG_TTL, move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                        std::future::ready(Err::<String, _>(GeneratedError(kind)))
                    })
                    .await
                    .unwrap_err();

                prop_assert_eq!(err.attempts(), expected, "round {}", round);
                prop_assert_eq!(err.kind(), Some(kind));
                prop_assert_eq!(calls.load(Ordering::SeqCst) as u32, expected);
                prop_assert!(store.get(&key).is_none());
                prop_assert!(store.is_empty());
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}

// Separate block with fewer cases for clock-driven expiry
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // An entry is served until its TTL elapses and refetched right after.
    #[test]
    fn prop_ttl_expiration_behavior(ttl_ms in 1u64..10_000, key in key_strategy()) {
        let rt = runtime();
        rt.block_on(async {
            let store = test_store(1);
            let ttl = Duration::from_millis(ttl_ms);
            let fetches = Arc::new(AtomicUsize::new(0));
            let fetch = {
                let fetches = fetches.clone();
                move || {
                    let n = fetches.fetch_add(1, Ordering::SeqCst);
                    std::future::ready(Ok::<_, GeneratedError>(n.to_string()))
                }
            };

            store.get_or_fetch(&key, ttl, fetch.clone()).await.unwrap();

            tokio::time::advance(ttl - Duration::from_millis(1)).await;
            prop_assert_eq!(store.get(&key), Some("0".to_string()));

            tokio::time::advance(Duration::from_millis(1)).await;
            prop_assert!(store.get(&key).is_none());

            let refreshed = store.get_or_fetch(&key, ttl, fetch).await.unwrap();
            prop_assert_eq!(refreshed, "1");
            prop_assert_eq!(fetches.load(Ordering::SeqCst), 2);
            Ok::<(), TestCaseError>(())
        })?;
    }
}

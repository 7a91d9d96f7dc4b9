//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store against a simple model and to pin down
//! the idle-time rules the reaper depends on.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::{CacheEntry, CacheStore};
use crate::expr::{CompiledExpression, Compiler, FormulaCompiler};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_TTL: Duration = Duration::from_secs(30);

fn compiled(value: i64) -> Arc<dyn CompiledExpression> {
    FormulaCompiler::new()
        .compile(&value.to_string())
        .expect("integer literal compiles")
}

// == Strategies ==
/// Small key space so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum StoreOp {
    Put { key: String, value: i64 },
    Get { key: String },
    Delete { key: String },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (key_strategy(), -1000i64..1000).prop_map(|(key, value)| StoreOp::Put { key, value }),
        key_strategy().prop_map(|key| StoreOp::Get { key }),
        key_strategy().prop_map(|key| StoreOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Every lookup returns the last value written for its key, or nothing
    // after a delete, and hit/miss counters agree with the model.
    #[test]
    fn prop_store_matches_model(ops in prop::collection::vec(store_op_strategy(), 1..60)) {
        let store = CacheStore::new(TEST_MAX_ENTRIES);
        let mut model: HashMap<String, i64> = HashMap::new();
        let mut expected_hits = 0u64;
        let mut expected_misses = 0u64;

        tokio_test::block_on(async {
            for op in ops {
                match op {
                    StoreOp::Put { key, value } => {
                        store.put(key.clone(), compiled(value), TEST_TTL).await;
                        model.insert(key, value);
                    }
                    StoreOp::Get { key } => {
                        let found = store.get(&key).await;
                        match model.get(&key) {
                            Some(expected) => {
                                expected_hits += 1;
                                let found = found.expect("modelled key should be cached");
                                prop_assert_eq!(found.eval_int(&Default::default()).unwrap(), *expected);
                            }
                            None => {
                                expected_misses += 1;
                                prop_assert!(found.is_none());
                            }
                        }
                    }
                    StoreOp::Delete { key } => {
                        let removed = store.delete(&key).await;
                        prop_assert_eq!(removed, model.remove(&key).is_some());
                    }
                }
            }

            let stats = store.stats().await;
            prop_assert_eq!(stats.hits, expected_hits);
            prop_assert_eq!(stats.misses, expected_misses);
            prop_assert_eq!(stats.total_entries, model.len());
            Ok(())
        })?;
    }

    // scan_expired reports exactly the entries idle strictly longer than the TTL.
    #[test]
    fn prop_scan_reports_exactly_idle_entries(
        offsets in prop::collection::hash_map(key_strategy(), 0u64..120, 1..20),
        scan_at in 0u64..180,
    ) {
        let store = CacheStore::new(TEST_MAX_ENTRIES);
        let start = Instant::now();

        tokio_test::block_on(async {
            for (key, offset) in &offsets {
                store
                    .put_at(key.clone(), compiled(1), TEST_TTL, start + Duration::from_secs(*offset))
                    .await;
            }

            let now = start + Duration::from_secs(scan_at);
            let reported: HashSet<String> = store.scan_expired(now).await.collect();
            let expected: HashSet<String> = offsets
                .iter()
                .filter(|(_, offset)| scan_at.saturating_sub(**offset) > TEST_TTL.as_secs())
                .map(|(key, _)| key.clone())
                .collect();

            prop_assert_eq!(reported, expected);
            Ok(())
        })?;
    }

    // The store never holds more than its capacity.
    #[test]
    fn prop_capacity_enforcement(keys in prop::collection::vec("[a-z]{1,6}", 1..200)) {
        let max_entries = 20;
        let store = CacheStore::new(max_entries);

        tokio_test::block_on(async {
            for key in keys {
                store.put(key.clone(), compiled(0), TEST_TTL).await;
                prop_assert!(store.contains(&key).await, "just inserted key must be present");
                let len = store.len().await;
                prop_assert!(len <= max_entries, "len {} exceeds max {}", len, max_entries);
            }
            Ok(())
        })?;
    }

    // Last access only ever moves forward, whatever order touches arrive in.
    #[test]
    fn prop_last_access_is_monotonic(touches in prop::collection::vec(0u64..10_000, 1..30)) {
        let start = Instant::now();
        let entry = CacheEntry::new(compiled(0), TEST_TTL, start);
        let mut latest = start;

        for millis in touches {
            let at = start + Duration::from_millis(millis);
            let before = entry.last_access();
            entry.touch(at);
            latest = latest.max(at);

            prop_assert!(entry.last_access() >= before);
            prop_assert_eq!(entry.last_access(), latest);
        }
    }
}

// == Concurrent Operation Correctness ==
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // Concurrent puts, lookups, and sweeps leave a consistent store: every
    // surviving key maps to a compiled form written for that key.
    #[test]
    fn prop_concurrent_operation_correctness(ops in prop::collection::vec(store_op_strategy(), 10..60)) {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(4)
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let store = Arc::new(CacheStore::new(TEST_MAX_ENTRIES));
            let mut written: HashMap<String, HashSet<i64>> = HashMap::new();
            let mut handles = Vec::new();

            for op in ops {
                if let StoreOp::Put { key, value } = &op {
                    written.entry(key.clone()).or_default().insert(*value);
                }
                let store = Arc::clone(&store);
                handles.push(tokio::spawn(async move {
                    match op {
                        StoreOp::Put { key, value } => store.put(key, compiled(value), TEST_TTL).await,
                        StoreOp::Get { key } => {
                            let _ = store.get(&key).await;
                        }
                        StoreOp::Delete { key } => {
                            store.delete(&key).await;
                        }
                    }
                    // Nothing is idle this early, so sweeps must not remove anything
                    let now = Instant::now();
                    for key in store.scan_expired(now).await {
                        store.remove_if_expired(&key, now).await;
                    }
                }));
            }

            for handle in handles {
                handle.await.expect("task should not panic");
            }

            prop_assert_eq!(store.stats().await.evictions, 0);
            for (key, values) in &written {
                if let Some(found) = store.get(key).await {
                    let value = found.eval_int(&Default::default()).unwrap();
                    prop_assert!(values.contains(&value), "key {} holds foreign value {}", key, value);
                }
            }
            Ok(())
        })?;
    }
}

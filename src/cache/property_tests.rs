//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the engine's read/write contract over random
//! operation sequences.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheEngine, CacheEntry, CacheStore, EngineConfig, MemoryBackend};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_DEFAULT_TTL: Duration = Duration::from_secs(300);

fn engine(max_entries: usize) -> CacheEngine<String> {
    CacheEngine::new(
        EngineConfig::new("prop", TEST_DEFAULT_TTL, max_entries),
        Arc::new(MemoryBackend),
    )
}

// == Strategies ==
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,32}"
}

fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,128}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    // Small key space so operations collide often
    let key = "[a-e]";
    prop_oneof![
        (key, valid_value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key.prop_map(|key| CacheOp::Get { key }),
        key.prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Gets within TTL always see the last value set for the key, and the
    // hit/miss counters match what the caller observed.
    #[test]
    fn prop_get_returns_last_set(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        tokio_test::block_on(async {
            let engine = engine(TEST_MAX_ENTRIES);
            let mut model: HashMap<String, String> = HashMap::new();
            let mut hits = 0u64;
            let mut misses = 0u64;

            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        engine.set(&key, value.clone(), None).await.unwrap();
                        model.insert(key, value);
                    }
                    CacheOp::Get { key } => {
                        let got = engine.get(&key).await;
                        prop_assert_eq!(got.as_ref(), model.get(&key));
                        if got.is_some() { hits += 1 } else { misses += 1 }
                    }
                    CacheOp::Delete { key } => {
                        engine.delete(&key).await;
                        model.remove(&key);
                    }
                }
            }

            let stats = engine.stats().await;
            prop_assert_eq!(stats.hits, hits);
            prop_assert_eq!(stats.misses, misses);
            prop_assert_eq!(stats.entry_count, model.len());
            Ok(())
        })?;
    }

    // The count never exceeds capacity after any insertion.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((valid_key_strategy(), valid_value_strategy()), 1..150)
    ) {
        tokio_test::block_on(async {
            let max_entries = 20;
            let engine = engine(max_entries);
            for (key, value) in entries {
                engine.set(&key, value, None).await.unwrap();
                let stats = engine.stats().await;
                prop_assert!(stats.entry_count <= max_entries);
                prop_assert_eq!(stats.entry_count, engine.len().await);
            }
            Ok(())
        })?;
    }

    // Filling to capacity, refreshing a subset, then inserting one more key
    // evicts the least recently accessed key outside that subset.
    #[test]
    fn prop_lru_eviction_respects_refresh(
        keys in prop::collection::hash_set(valid_key_strategy(), 3..12),
        refresh_mask in prop::collection::vec(any::<bool>(), 12),
        new_key in valid_key_strategy(),
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        prop_assume!(!keys.contains(&new_key));
        let refreshed: Vec<&String> = keys
            .iter()
            .zip(refresh_mask.iter())
            .filter(|(_, refresh)| **refresh)
            .map(|(key, _)| key)
            .collect();
        prop_assume!(refreshed.len() < keys.len());

        tokio_test::block_on(async {
            let engine = engine(keys.len());
            for key in &keys {
                engine.set(key, key.clone(), None).await.unwrap();
            }
            for key in &refreshed {
                prop_assert!(engine.get(key).await.is_some());
            }

            let refreshed_set: HashSet<&String> = refreshed.iter().copied().collect();
            let expected_evicted = keys
                .iter()
                .find(|key| !refreshed_set.contains(key))
                .cloned()
                .unwrap();

            engine.set(&new_key, "new".to_string(), None).await.unwrap();

            prop_assert_eq!(engine.len().await, keys.len());
            prop_assert!(!engine.contains(&expected_evicted).await);
            prop_assert!(engine.contains(&new_key).await);
            for key in keys.iter().filter(|key| **key != expected_evicted) {
                prop_assert!(engine.contains(key).await, "{} evicted unexpectedly", key);
            }
            Ok(())
        })?;
    }

    // hitRate is h / (h + m), and 0 when nothing was read.
    #[test]
    fn prop_hit_rate_formula(h in 0u64..40, m in 0u64..40) {
        tokio_test::block_on(async {
            let engine = engine(TEST_MAX_ENTRIES);
            engine.set("present", "v".to_string(), None).await.unwrap();
            for _ in 0..h {
                engine.get("present").await;
            }
            for _ in 0..m {
                engine.get("absent").await;
            }

            let stats = engine.stats().await;
            let expected = if h + m == 0 { 0.0 } else { h as f64 / (h + m) as f64 };
            prop_assert!((stats.hit_rate - expected).abs() < f64::EPSILON);
            Ok(())
        })?;
    }

    // Running aggregates equal the sums over the live entries.
    #[test]
    fn prop_store_aggregates_exact(
        entries in prop::collection::vec(("[a-h]", valid_value_strategy()), 1..80),
        removals in prop::collection::vec("[a-h]", 0..10),
    ) {
        let mut store: CacheStore<String> = CacheStore::new(5, "1");
        let mut sizes: HashMap<String, u64> = HashMap::new();

        for (key, value) in entries {
            store.purge_expired();
            store.remove(&key);
            sizes.remove(&key);
            for evicted in store.make_room() {
                sizes.remove(&evicted);
            }
            let entry = CacheEntry::new(key.clone(), value, TEST_DEFAULT_TTL, "1").unwrap();
            sizes.insert(key, entry.size_bytes);
            store.insert(entry);
        }
        for key in removals {
            store.remove(&key);
            sizes.remove(&key);
        }

        let stats = store.stats();
        prop_assert_eq!(stats.entry_count, sizes.len());
        prop_assert_eq!(stats.total_bytes, sizes.values().sum::<u64>());
        prop_assert!(stats.entry_count <= 5);
    }
}

// Separate block with few cases for time-sensitive TTL checks
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    #[test]
    fn prop_ttl_expiration_behavior(key in valid_key_strategy(), value in valid_value_strategy()) {
        tokio_test::block_on(async {
            let engine = engine(TEST_MAX_ENTRIES);
            engine.set(&key, value.clone(), Some(Duration::from_millis(40))).await.unwrap();
            prop_assert_eq!(engine.get(&key).await, Some(value));

            tokio::time::sleep(Duration::from_millis(80)).await;

            prop_assert!(engine.get(&key).await.is_none());
            let stats = engine.stats().await;
            prop_assert_eq!(stats.misses, 1);
            prop_assert_eq!(stats.entry_count, 0);
            Ok(())
        })?;
    }
}

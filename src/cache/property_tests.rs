//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the TTL, prune and invalidation behavior of the
//! metadata cache under arbitrary timings and operation sequences.

use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use crate::cache::MetadataCache;

// == Helpers ==
/// Runs `f` on a current-thread runtime with a paused clock.
fn with_paused_clock<F: std::future::Future<Output = ()>>(f: F) {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
        .block_on(f)
}

fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}@g\\.us"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: u32 },
    Invalidate { key: String },
    Advance { millis: u64 },
    Prune,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    let keys = prop::sample::select(vec!["a@g.us", "b@g.us", "c@g.us"]);
    prop_oneof![
        (keys.clone(), any::<u32>()).prop_map(|(key, value)| CacheOp::Set {
            key: key.to_string(),
            value
        }),
        keys.prop_map(|key| CacheOp::Invalidate {
            key: key.to_string()
        }),
        (0u64..400).prop_map(|millis| CacheOp::Advance { millis }),
        Just(CacheOp::Prune),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // An entry is readable strictly before its TTL elapses and never after,
    // whether or not prune ran in between.
    #[test]
    fn prop_ttl_validity(
        key in valid_key_strategy(),
        ttl_ms in 1u64..5_000,
        elapsed_ms in 0u64..10_000,
        prune_first in any::<bool>(),
    ) {
        with_paused_clock(async move {
            let mut cache = MetadataCache::with_ttl_ms(ttl_ms);
            cache.set(key.clone(), 7u8);

            tokio::time::advance(Duration::from_millis(elapsed_ms)).await;
            if prune_first {
                cache.prune();
            }

            let expected = if elapsed_ms < ttl_ms { Some(&7u8) } else { None };
            assert_eq!(cache.get(&key), expected);
        });
    }

    // Interleaving prune calls into any operation sequence never changes
    // what get returns.
    #[test]
    fn prop_prune_does_not_change_reads(ops in prop::collection::vec(cache_op_strategy(), 1..40)) {
        with_paused_clock(async move {
            let mut pruned = MetadataCache::with_ttl_ms(500);
            let mut unpruned = MetadataCache::with_ttl_ms(500);

            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        pruned.set(key.clone(), value);
                        unpruned.set(key, value);
                    }
                    CacheOp::Invalidate { key } => {
                        pruned.invalidate(&key);
                        unpruned.invalidate(&key);
                    }
                    CacheOp::Advance { millis } => {
                        tokio::time::advance(Duration::from_millis(millis)).await;
                    }
                    CacheOp::Prune => {
                        pruned.prune();
                    }
                }

                for key in ["a@g.us", "b@g.us", "c@g.us"] {
                    assert_eq!(pruned.get(key).copied(), unpruned.get(key).copied());
                }
            }
        });
    }

    // Primed entries are all readable, and invalidate or clear hides them
    // immediately.
    #[test]
    fn prop_prime_invalidate_clear(
        snapshots in prop::collection::hash_map(valid_key_strategy(), any::<u16>(), 1..20),
    ) {
        with_paused_clock(async move {
            let mut cache = MetadataCache::with_ttl_ms(60_000);
            let written = cache.prime(snapshots.clone());
            assert_eq!(written, snapshots.len());

            let (first, _) = snapshots.iter().next().unwrap();
            cache.invalidate(first);
            assert_eq!(cache.get(first), None);

            let remaining: HashMap<&String, &u16> =
                snapshots.iter().filter(|(key, _)| *key != first).collect();
            for (key, value) in &remaining {
                assert_eq!(cache.get(key), Some(*value));
            }

            cache.clear();
            for key in snapshots.keys() {
                assert_eq!(cache.get(key), None);
            }
        });
    }
}

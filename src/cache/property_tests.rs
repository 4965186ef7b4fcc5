//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the reload decision table and the write/read
//! invariants of the cache manager.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{Map, Value};

use crate::cache::{CacheManager, CACHE_KEY};
use crate::models::CachedObject;
use crate::policy::{needs_reload_at, CachePolicy};
use crate::store::{MemoryStore, QuerySpec};

// == Strategies ==
fn policy_strategy() -> impl Strategy<Value = CachePolicy> {
    prop::sample::select(CachePolicy::ALL.to_vec())
}

/// Cache keys (non-blank)
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_]{1,16}"
}

/// Collection names; never collide with the reserved master collection
fn collection_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z]{0,11}"
}

fn object_strategy() -> impl Strategy<Value = CachedObject> {
    ("[a-zA-Z0-9]{15}", "[a-zA-Z ]{0,24}", any::<i32>()).prop_map(|(id, name, revenue)| {
        let mut raw = Map::new();
        raw.insert("Id".to_string(), Value::from(id));
        raw.insert("Name".to_string(), Value::from(name));
        raw.insert("AnnualRevenue".to_string(), Value::from(revenue));
        CachedObject::new(raw)
    })
}

fn objects_strategy() -> impl Strategy<Value = Vec<CachedObject>> {
    prop::collection::vec(object_strategy(), 1..8)
}

fn expected_fixed_outcome(policy: CachePolicy) -> Option<bool> {
    match policy {
        CachePolicy::IgnoreCache
        | CachePolicy::ReturnCacheDontReload
        | CachePolicy::InvalidateDontReload => Some(false),
        CachePolicy::ReloadAndReturnCache
        | CachePolicy::ReloadAndReturnCacheOnFailure
        | CachePolicy::InvalidateAndReload => Some(true),
        CachePolicy::ReloadIfExpiredAndReturnCache => None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Non-expiry policies return their table value whatever the timestamps.
    #[test]
    fn prop_fixed_policies_ignore_time(
        policy in policy_strategy(),
        cache_exists in any::<bool>(),
        now in any::<i64>(),
        last in any::<i64>(),
        stale in any::<i64>(),
        other_now in any::<i64>(),
        other_last in any::<i64>(),
    ) {
        if let Some(expected) = expected_fixed_outcome(policy) {
            prop_assert_eq!(needs_reload_at(now, cache_exists, policy, last, stale), expected);
            prop_assert_eq!(
                needs_reload_at(other_now, !cache_exists, policy, other_last, stale.wrapping_neg()),
                expected
            );
        }
    }

    // The expiry policy reloads iff the degenerate guard trips or the age
    // exceeds the threshold.
    #[test]
    fn prop_expiry_policy_matches_rule(
        cache_exists in any::<bool>(),
        now in 1i64..4_000_000_000_000,
        age in -10_000i64..10_000_000,
        stale in -1_000i64..10_000_000,
    ) {
        let last = now - age;
        let expected = !cache_exists || stale <= 0 || last <= 0 || (now - last) > stale;
        prop_assert_eq!(
            needs_reload_at(now, cache_exists, CachePolicy::ReloadIfExpiredAndReturnCache, last, stale),
            expected
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Writing the same key twice leaves one record and the second value set
    // in memory.
    #[test]
    fn prop_upsert_is_idempotent(
        collection in collection_strategy(),
        key in key_strategy(),
        first in objects_strategy(),
        second in objects_strategy(),
    ) {
        let manager = CacheManager::new(Arc::new(MemoryStore::new()));
        prop_assert!(manager.write(&first, &key, &collection).is_persisted());
        prop_assert!(manager.write(&second, &key, &collection).is_persisted());

        let spec = QuerySpec::exact(collection.as_str(), CACHE_KEY, key.as_str(), 10);
        prop_assert_eq!(manager.store().count(&spec).unwrap(), 1);
        prop_assert_eq!(manager.overlay().get::<CachedObject>(&key), Some(second.clone()));
    }

    // A fresh manager over the same store decodes exactly what was written.
    #[test]
    fn prop_round_trip_through_store(
        collection in collection_strategy(),
        key in key_strategy(),
        values in objects_strategy(),
    ) {
        let store = Arc::new(MemoryStore::new());
        let writer = CacheManager::new(store.clone());
        writer.write(&values, &key, &collection);

        let reader = CacheManager::new(store);
        prop_assert!(reader.overlay().is_empty());
        prop_assert_eq!(reader.read::<CachedObject>(&collection, &key), values);
        prop_assert!(reader.overlay().contains::<CachedObject>(&key));
    }

    // Every written collection is registered exactly once; removal
    // de-registers it.
    #[test]
    fn prop_registry_consistency(
        writes in prop::collection::vec((collection_strategy(), key_strategy()), 1..12),
        values in objects_strategy(),
    ) {
        let manager = CacheManager::new(Arc::new(MemoryStore::new()));
        for (collection, key) in &writes {
            manager.write(&values, key, collection);
        }

        let names = manager.collection_names();
        for (collection, _) in &writes {
            prop_assert_eq!(names.iter().filter(|n| *n == collection).count(), 1);
        }

        let (removed, _) = &writes[0];
        prop_assert!(manager.remove_collection(removed));
        prop_assert_eq!(
            manager.collection_names().iter().filter(|n| *n == removed).count(),
            0
        );
    }
}

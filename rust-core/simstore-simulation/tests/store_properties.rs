// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Store-level properties of the simulation service.
//!
//! Runs against the in-memory cache, plus two wrappers: one that records
//! what a reader would see mid-import, and one that fails on demand.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use proptest::prelude::*;
use simstore_cache::{Cache, CacheError, CacheKey, CacheValue, InMemoryCache};
use simstore_simulation::{
    FieldMatcher, GlobalActions, ImportMode, ImportOutcome, RequestMatcher, ResponseDetails, SchemaVersion, SimulationDocument,
    SimulationError, SimulationPair, SimulationStore,
};

fn pair(destination: &str, path: &str, status: u16) -> SimulationPair {
    SimulationPair::new(
        RequestMatcher::default()
            .with_method(FieldMatcher::exact("GET"))
            .with_destination(FieldMatcher::exact(destination))
            .with_path(FieldMatcher::exact(path)),
        ResponseDetails::new(status, format!("body of {path}")),
    )
}

fn document(pairs: Vec<SimulationPair>) -> SimulationDocument {
    SimulationDocument::new(pairs, GlobalActions::default())
}

fn as_set(pairs: &[SimulationPair]) -> BTreeSet<String> {
    pairs
        .iter()
        .map(|p| serde_json::to_string(p).unwrap())
        .collect()
}

// ===========================================================================
// Round trip, filter, partial import, version rejection
// ===========================================================================

#[tokio::test]
async fn test_override_then_get_returns_exactly_the_imported_pairs() {
    let store = SimulationStore::new(Arc::new(InMemoryCache::new()));
    store
        .put_simulation(document(vec![pair("old.example.com", "/stale", 200)]), false)
        .await
        .unwrap();

    let pairs = vec![
        pair("example.com", "/one", 200),
        pair("example.com", "/two", 404),
        pair("other.example.com", "/three", 500),
    ];
    let result = store.put_simulation(document(pairs.clone()), true).await.unwrap();
    assert_eq!(result.accepted, 3);
    assert!(result.warnings.is_empty());

    let exported = store.get_simulation().await.unwrap();
    assert_eq!(as_set(exported.pairs()), as_set(&pairs));
}

#[tokio::test]
async fn test_filter_by_path_prefix() {
    let store = SimulationStore::new(Arc::new(InMemoryCache::new()));
    store
        .put_simulation(
            document(vec![
                pair("example.com", "/a", 200),
                pair("example.com", "/b", 200),
                pair("example.com", "/a/c", 200),
            ]),
            true,
        )
        .await
        .unwrap();

    let filtered = store.get_filtered_simulation("/a").await.unwrap();
    let paths: BTreeSet<String> = filtered
        .pairs()
        .iter()
        .map(|p| p.request.path[0].value.clone().unwrap())
        .collect();
    assert_eq!(paths, BTreeSet::from(["/a".to_string(), "/a/c".to_string()]));

    // Filtering never mutates storage.
    assert_eq!(store.cache().records_count().await.unwrap(), 3);

    // No match is an empty document, not an error.
    let none = store.get_filtered_simulation("^nowhere").await.unwrap();
    assert!(none.pairs().is_empty());
}

#[tokio::test]
async fn test_invalid_filter_pattern_is_a_client_error() {
    let store = SimulationStore::new(Arc::new(InMemoryCache::new()));
    let err = store.get_filtered_simulation("(").await.unwrap_err();
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_partial_import_skips_only_the_invalid_pair() {
    let store = SimulationStore::new(Arc::new(InMemoryCache::new()));

    let mut broken = pair("example.com", "/two", 200);
    broken.request.path[0].matcher = None;

    let first = pair("example.com", "/one", 200);
    let third = pair("example.com", "/three", 200);
    let result = store
        .put_simulation(document(vec![first.clone(), broken, third.clone()]), true)
        .await
        .unwrap();

    assert_eq!(result.accepted, 2);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].starts_with("pair 1:"));
    assert!(result.fatal_error.is_none());

    let exported = store.get_simulation().await.unwrap();
    assert_eq!(as_set(exported.pairs()), as_set(&[first, third]));
}

#[tokio::test]
async fn test_matcher_with_unknown_options_is_skipped() {
    let store = SimulationStore::new(Arc::new(InMemoryCache::new()));
    let body = br#"{
        "data": {
            "pairs": [{
                "request": {
                    "path": [{"matcher": "exact", "value": "/a", "config": {"ignoreCase": true}}]
                },
                "response": {"status": 200, "body": "a"}
            }]
        },
        "meta": {"schemaVersion": "v6"}
    }"#;

    let outcome = store.import(body, ImportMode::Override).await.unwrap();
    let result = match outcome {
        ImportOutcome::Warnings(result) => result,
        other => panic!("expected warnings, got {other:?}"),
    };
    assert_eq!(result.accepted, 0);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("unsupported field 'config'"));
    assert_eq!(store.cache().records_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unsupported_version_changes_nothing() {
    let store = SimulationStore::new(Arc::new(InMemoryCache::new()));
    store
        .put_simulation(document(vec![pair("example.com", "/keep", 200)]), true)
        .await
        .unwrap();

    for version in [SchemaVersion(0), SchemaVersion(7), SchemaVersion(42)] {
        let mut doc = document(vec![pair("example.com", "/new", 200)]);
        doc.meta.schema_version = version;

        // Override would clear the store if the version check came later.
        let result = store.put_simulation(doc, true).await.unwrap();
        assert!(result.is_fatal(), "{version} should be rejected");
        assert_eq!(result.accepted, 0);
    }

    let exported = store.get_simulation().await.unwrap();
    assert_eq!(exported.pairs().len(), 1);
    assert_eq!(exported.pairs()[0].request.path[0].value.as_deref(), Some("/keep"));
}

#[tokio::test]
async fn test_export_order_is_deterministic() {
    let store = SimulationStore::new(Arc::new(InMemoryCache::new()));
    let pairs: Vec<_> = (0..10)
        .map(|i| pair("example.com", &format!("/p{i}"), 200))
        .collect();
    store.put_simulation(document(pairs), true).await.unwrap();

    let first = store.get_simulation().await.unwrap();
    let second = store.get_simulation().await.unwrap();
    assert_eq!(first.pairs(), second.pairs());
}

// ===========================================================================
// Override window
// ===========================================================================

/// Records how many entries a reader would see at the first write after a
/// clear.
struct WindowProbe {
    inner: InMemoryCache,
    cleared: AtomicBool,
    seen_at_first_set: Mutex<Option<usize>>,
}

#[async_trait]
impl Cache for WindowProbe {
    async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), CacheError> {
        if self.cleared.swap(false, Ordering::SeqCst) {
            let visible = self.inner.records_count().await?;
            *self.seen_at_first_set.lock().unwrap() = Some(visible);
        }
        self.inner.set(key, value).await
    }

    async fn get(&self, key: &[u8]) -> Result<CacheValue, CacheError> {
        self.inner.get(key).await
    }

    async fn get_all_values(&self) -> Result<Vec<CacheValue>, CacheError> {
        self.inner.get_all_values().await
    }

    async fn get_all_entries(&self) -> Result<BTreeMap<CacheKey, CacheValue>, CacheError> {
        self.inner.get_all_entries().await
    }

    async fn get_all_keys(&self) -> Result<BTreeSet<CacheKey>, CacheError> {
        self.inner.get_all_keys().await
    }

    async fn records_count(&self) -> Result<usize, CacheError> {
        self.inner.records_count().await
    }

    async fn delete(&self, key: &[u8]) -> Result<(), CacheError> {
        self.inner.delete(key).await
    }

    async fn delete_data(&self) -> Result<(), CacheError> {
        self.inner.delete_data().await?;
        self.cleared.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn flush(&self) -> Result<(), CacheError> {
        self.inner.flush().await
    }

    fn name(&self) -> &str {
        "window-probe"
    }
}

#[tokio::test]
async fn test_override_import_has_an_observable_empty_window() {
    let probe = Arc::new(WindowProbe {
        inner: InMemoryCache::new(),
        cleared: AtomicBool::new(false),
        seen_at_first_set: Mutex::new(None),
    });
    let store = SimulationStore::new(Arc::clone(&probe));
    store
        .put_simulation(document(vec![pair("a.com", "/1", 200), pair("a.com", "/2", 200)]), false)
        .await
        .unwrap();

    store
        .put_simulation(document(vec![pair("b.com", "/3", 200)]), true)
        .await
        .unwrap();

    // Between the clear and the first insert, a reader sees an empty store.
    assert_eq!(*probe.seen_at_first_set.lock().unwrap(), Some(0));
    assert_eq!(store.get_simulation().await.unwrap().pairs().len(), 1);
}

// ===========================================================================
// Error propagation
// ===========================================================================

/// Fails every operation once `broken` is set.
#[derive(Default)]
struct FlakyCache {
    inner: InMemoryCache,
    broken: AtomicBool,
}

impl FlakyCache {
    fn check(&self) -> Result<(), CacheError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("disk unplugged".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Cache for FlakyCache {
    async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), CacheError> {
        self.check()?;
        self.inner.set(key, value).await
    }

    async fn get(&self, key: &[u8]) -> Result<CacheValue, CacheError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn get_all_values(&self) -> Result<Vec<CacheValue>, CacheError> {
        self.check()?;
        self.inner.get_all_values().await
    }

    async fn get_all_entries(&self) -> Result<BTreeMap<CacheKey, CacheValue>, CacheError> {
        self.check()?;
        self.inner.get_all_entries().await
    }

    async fn get_all_keys(&self) -> Result<BTreeSet<CacheKey>, CacheError> {
        self.check()?;
        self.inner.get_all_keys().await
    }

    async fn records_count(&self) -> Result<usize, CacheError> {
        self.check()?;
        self.inner.records_count().await
    }

    async fn delete(&self, key: &[u8]) -> Result<(), CacheError> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn delete_data(&self) -> Result<(), CacheError> {
        self.check()?;
        self.inner.delete_data().await
    }

    async fn flush(&self) -> Result<(), CacheError> {
        self.check()?;
        self.inner.flush().await
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

#[tokio::test]
async fn test_delete_simulation_surfaces_backend_failure() {
    let cache = Arc::new(FlakyCache::default());
    let store = SimulationStore::new(Arc::clone(&cache));
    store
        .put_simulation(document(vec![pair("a.com", "/1", 200)]), true)
        .await
        .unwrap();

    cache.broken.store(true, Ordering::SeqCst);
    let err = store.delete_simulation().await.unwrap_err();
    assert!(matches!(err, SimulationError::Cache(CacheError::Backend(_))));

    cache.broken.store(false, Ordering::SeqCst);
    assert_eq!(store.get_simulation().await.unwrap().pairs().len(), 1);
}

#[tokio::test]
async fn test_put_and_get_propagate_backend_failure() {
    let cache = Arc::new(FlakyCache::default());
    let store = SimulationStore::new(Arc::clone(&cache));
    cache.broken.store(true, Ordering::SeqCst);

    let err = store
        .put_simulation(document(vec![pair("a.com", "/1", 200)]), false)
        .await
        .unwrap_err();
    assert!(matches!(err, SimulationError::Cache(_)));

    let err = store.get_simulation().await.unwrap_err();
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn test_store_over_dyn_cache() {
    let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new());
    let store: SimulationStore<dyn Cache> = SimulationStore::new(cache);

    let result = store
        .put_simulation(document(vec![pair("a.com", "/1", 200)]), true)
        .await
        .unwrap();
    assert_eq!(result.accepted, 1);
    assert_eq!(store.cache().name(), "in-memory");
}

// ===========================================================================
// Property-based round trip
// ===========================================================================

proptest! {
    #[test]
    fn test_round_trip_preserves_distinct_pairs(
        paths in prop::collection::btree_set("/[a-z]{1,6}(/[a-z0-9]{1,4})?", 0..12),
        status in 200u16..600,
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let store = SimulationStore::new(Arc::new(InMemoryCache::new()));
            let pairs: Vec<_> = paths.iter().map(|p| pair("example.com", p, status)).collect();

            let result = store.put_simulation(document(pairs.clone()), true).await.unwrap();
            prop_assert_eq!(result.accepted, pairs.len());
            prop_assert!(result.warnings.is_empty());

            let exported = store.get_simulation().await.unwrap();
            prop_assert_eq!(as_set(exported.pairs()), as_set(&pairs));
            prop_assert_eq!(store.cache().records_count().await.unwrap(), pairs.len());

            Ok(())
        })?;
    }
}

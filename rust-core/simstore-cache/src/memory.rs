// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory cache backend for SimStore.
//
// Uses a `BTreeMap` wrapped in a tokio `RwLock`. Each operation takes the
// lock once, so enumeration and bulk clear are atomic with respect to each
// other. Intended for tests, development and ephemeral simulations.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::{Cache, CacheKey, CacheValue};
use crate::error::CacheError;

/// An in-memory cache backed by a sorted `BTreeMap`.
///
/// All data lives in process memory and is lost on drop. Clones share the
/// same underlying map.
///
/// # Example
///
/// ```rust
/// use simstore_cache::{Cache, InMemoryCache};
///
/// # tokio_test::block_on(async {
/// let cache = InMemoryCache::new();
/// cache.set(b"hello", b"world").await.unwrap();
/// assert_eq!(cache.get(b"hello").await.unwrap(), b"world".to_vec());
/// assert_eq!(cache.records_count().await.unwrap(), 1);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    data: Arc<RwLock<BTreeMap<CacheKey, CacheValue>>>,
}

impl InMemoryCache {
    /// Create a new, empty in-memory cache.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), CacheError> {
        let mut map = self.data.write().await;
        map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn get(&self, key: &[u8]) -> Result<CacheValue, CacheError> {
        let map = self.data.read().await;
        map.get(key).cloned().ok_or_else(|| CacheError::not_found(key))
    }

    async fn get_all_values(&self) -> Result<Vec<CacheValue>, CacheError> {
        let map = self.data.read().await;
        Ok(map.values().cloned().collect())
    }

    async fn get_all_entries(&self) -> Result<BTreeMap<CacheKey, CacheValue>, CacheError> {
        let map = self.data.read().await;
        Ok(map.clone())
    }

    async fn get_all_keys(&self) -> Result<BTreeSet<CacheKey>, CacheError> {
        let map = self.data.read().await;
        Ok(map.keys().cloned().collect())
    }

    async fn records_count(&self) -> Result<usize, CacheError> {
        Ok(self.data.read().await.len())
    }

    async fn delete(&self, key: &[u8]) -> Result<(), CacheError> {
        let mut map = self.data.write().await;
        match map.remove(key) {
            Some(_) => Ok(()),
            None => Err(CacheError::not_found(key)),
        }
    }

    async fn delete_data(&self) -> Result<(), CacheError> {
        self.data.write().await.clear();
        Ok(())
    }

    async fn flush(&self) -> Result<(), CacheError> {
        // Nothing is buffered: every write is visible immediately.
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

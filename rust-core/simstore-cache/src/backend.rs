// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core cache trait for SimStore.
//
// Defines the `Cache` trait that every storage backend must satisfy: a flat
// key/value map with whole-store enumeration and bulk clear. Keys and values
// are opaque bytes; deriving keys and interpreting values is the job of the
// simulation service layered on top.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CacheError;

/// Opaque key identifying one stored interaction definition.
pub type CacheKey = Vec<u8>;

/// Opaque serialized form of one request/response pair.
pub type CacheValue = Vec<u8>;

/// A storage-agnostic key/value cache.
///
/// Every method is its own atomic unit: implementations hold their internal
/// lock or transaction for the duration of one call and never across calls.
/// There are no multi-call transactions.
///
/// Implementations must be safe to share across threads and tokio tasks.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    ///
    /// Concurrent readers of `key` observe either the old or the new value,
    /// never a partial write.
    async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), CacheError>;

    /// Retrieve the value stored under `key`.
    ///
    /// Returns [`CacheError::NotFound`] if the key is absent.
    async fn get(&self, key: &[u8]) -> Result<CacheValue, CacheError>;

    /// Return every stored value. An empty store yields an empty vector.
    async fn get_all_values(&self) -> Result<Vec<CacheValue>, CacheError>;

    /// Return the full key to value mapping, ordered by key.
    async fn get_all_entries(&self) -> Result<BTreeMap<CacheKey, CacheValue>, CacheError>;

    /// Return the set of stored keys.
    async fn get_all_keys(&self) -> Result<BTreeSet<CacheKey>, CacheError>;

    /// Return the number of stored entries without materializing values.
    async fn records_count(&self) -> Result<usize, CacheError>;

    /// Remove the entry stored under `key`.
    ///
    /// Deleting a missing key is an error ([`CacheError::NotFound`]) so that
    /// callers notice stale assumptions.
    async fn delete(&self, key: &[u8]) -> Result<(), CacheError>;

    /// Remove every entry. Clearing an empty store succeeds.
    ///
    /// Concurrent enumeration sees either the full pre-clear contents or the
    /// empty store.
    async fn delete_data(&self) -> Result<(), CacheError>;

    /// Flush any buffered writes to durable storage. Called at shutdown.
    async fn flush(&self) -> Result<(), CacheError>;

    /// A human-readable name for this backend, used in logging.
    fn name(&self) -> &str;
}

#[async_trait]
impl<C: Cache + ?Sized> Cache for Arc<C> {
    async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), CacheError> {
        (**self).set(key, value).await
    }

    async fn get(&self, key: &[u8]) -> Result<CacheValue, CacheError> {
        (**self).get(key).await
    }

    async fn get_all_values(&self) -> Result<Vec<CacheValue>, CacheError> {
        (**self).get_all_values().await
    }

    async fn get_all_entries(&self) -> Result<BTreeMap<CacheKey, CacheValue>, CacheError> {
        (**self).get_all_entries().await
    }

    async fn get_all_keys(&self) -> Result<BTreeSet<CacheKey>, CacheError> {
        (**self).get_all_keys().await
    }

    async fn records_count(&self) -> Result<usize, CacheError> {
        (**self).records_count().await
    }

    async fn delete(&self, key: &[u8]) -> Result<(), CacheError> {
        (**self).delete(key).await
    }

    async fn delete_data(&self) -> Result<(), CacheError> {
        (**self).delete_data().await
    }

    async fn flush(&self) -> Result<(), CacheError> {
        (**self).flush().await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SimStore Cache Abstraction
//
// This crate provides the storage-agnostic key/value contract that every
// SimStore backend satisfies. The simulation service is written against the
// `Cache` trait only, so backends can be chosen at startup without touching
// application logic.
//
// # Modules
//
// - [`backend`] -- The `Cache` trait and the key/value type aliases.
// - [`error`] -- The `CacheError` enum (not-found vs backend failure).
// - [`memory`] -- An in-memory `BTreeMap`-based backend for tests and
//   ephemeral simulations.
// - `redb_backend` -- A durable single-file backend (feature `redb-backend`).
//
// # Example
//
// ```rust
// use simstore_cache::{Cache, InMemoryCache};
//
// # tokio_test::block_on(async {
// let cache = InMemoryCache::new();
// cache.set(b"k1", b"v1").await.unwrap();
// cache.set(b"k2", b"v2").await.unwrap();
//
// assert_eq!(cache.records_count().await.unwrap(), 2);
// cache.delete_data().await.unwrap();
// assert!(cache.get_all_entries().await.unwrap().is_empty());
// # });
// ```

pub mod backend;
pub mod error;
pub mod memory;

#[cfg(feature = "redb-backend")]
pub mod redb_backend;

pub use backend::{Cache, CacheKey, CacheValue};
pub use error::CacheError;
pub use memory::InMemoryCache;

#[cfg(feature = "redb-backend")]
pub use redb_backend::RedbCache;

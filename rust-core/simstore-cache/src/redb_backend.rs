// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// redb-backed durable cache for SimStore.
//
// Uses redb (pure Rust, B-tree, ACID, single-file database) as the durable
// embedded backend. No C/C++ dependencies.
//
// # Design
//
// - Single redb `Database` file containing one table of pairs.
// - Read transactions for all read operations. Each read works against one
//   MVCC snapshot, so enumeration never observes a half-applied write.
// - Write transactions for set/delete/clear (serialised by redb internally).
// - `delete_data` drops the whole table inside one write transaction.
// - All redb calls run on the blocking pool via `spawn_blocking`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use redb::{
    Database, ReadOnlyTable, ReadableDatabase, ReadableTable, ReadableTableMetadata,
    TableDefinition, TableError,
};
use tracing::debug;

use crate::backend::{Cache, CacheKey, CacheValue};
use crate::error::CacheError;

/// Table holding one serialized pair per key.
const PAIRS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("pairs");

/// A durable cache powered by redb.
///
/// Thread-safe: `Database` is `Send + Sync` and handles internal locking.
///
/// # Example
///
/// ```rust,no_run
/// use simstore_cache::{Cache, RedbCache};
///
/// # tokio_test::block_on(async {
/// let cache = RedbCache::open("/tmp/simstore-test.redb").unwrap();
/// cache.set(b"hello", b"world").await.unwrap();
/// assert_eq!(cache.get(b"hello").await.unwrap(), b"world".to_vec());
/// # });
/// ```
pub struct RedbCache {
    db: Arc<Database>,
    /// Path to the database file (for diagnostics).
    path: PathBuf,
}

impl RedbCache {
    /// Open or create a redb database at the given path.
    ///
    /// Creates parent directories if they don't exist. The pairs table is
    /// created on first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(&path).map_err(|e| {
            CacheError::Backend(format!("failed to open redb at {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "opened redb cache");

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    /// Return the filesystem path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` against a read snapshot of the pairs table on the blocking
    /// pool. `op` receives `None` when nothing has been written yet.
    async fn read<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        T: Send + 'static,
        F: FnOnce(Option<ReadOnlyTable<&'static [u8], &'static [u8]>>) -> Result<T, CacheError>
            + Send
            + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let txn = db
                .begin_read()
                .map_err(|e| CacheError::Backend(format!("read txn: {e}")))?;
            match txn.open_table(PAIRS_TABLE) {
                Ok(table) => op(Some(table)),
                Err(TableError::TableDoesNotExist(_)) => op(None),
                Err(e) => Err(CacheError::Backend(format!("open table: {e}"))),
            }
        })
        .await
        .map_err(|e| CacheError::Backend(format!("task join: {e}")))?
    }
}

impl std::fmt::Debug for RedbCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbCache").field("path", &self.path).finish()
    }
}

fn corrupted(context: &str) -> impl Fn(redb::StorageError) -> CacheError + '_ {
    move |e| CacheError::CorruptedData(format!("{context}: {e}"))
}

#[async_trait]
impl Cache for RedbCache {
    async fn set(&self, key: &[u8], value: &[u8]) -> Result<(), CacheError> {
        let db = Arc::clone(&self.db);
        let key = key.to_vec();
        let value = value.to_vec();

        tokio::task::spawn_blocking(move || -> Result<(), CacheError> {
            let txn = db
                .begin_write()
                .map_err(|e| CacheError::Backend(format!("write txn: {e}")))?;
            {
                let mut table = txn
                    .open_table(PAIRS_TABLE)
                    .map_err(|e| CacheError::Backend(format!("open table: {e}")))?;
                table
                    .insert(key.as_slice(), value.as_slice())
                    .map_err(corrupted("insert"))?;
            }
            txn.commit()
                .map_err(|e| CacheError::Backend(format!("commit: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| CacheError::Backend(format!("task join: {e}")))?
    }

    async fn get(&self, key: &[u8]) -> Result<CacheValue, CacheError> {
        let key = key.to_vec();
        self.read(move |table| {
            let found = match table {
                Some(table) => table
                    .get(key.as_slice())
                    .map_err(corrupted("get"))?
                    .map(|guard| guard.value().to_vec()),
                None => None,
            };
            found.ok_or_else(|| CacheError::not_found(&key))
        })
        .await
    }

    async fn get_all_values(&self) -> Result<Vec<CacheValue>, CacheError> {
        self.read(|table| {
            let Some(table) = table else {
                return Ok(Vec::new());
            };
            let mut values = Vec::new();
            for entry in table.iter().map_err(corrupted("iter"))? {
                let (_, value) = entry.map_err(corrupted("iter entry"))?;
                values.push(value.value().to_vec());
            }
            Ok(values)
        })
        .await
    }

    async fn get_all_entries(&self) -> Result<BTreeMap<CacheKey, CacheValue>, CacheError> {
        self.read(|table| {
            let Some(table) = table else {
                return Ok(BTreeMap::new());
            };
            let mut entries = BTreeMap::new();
            for entry in table.iter().map_err(corrupted("iter"))? {
                let (key, value) = entry.map_err(corrupted("iter entry"))?;
                entries.insert(key.value().to_vec(), value.value().to_vec());
            }
            Ok(entries)
        })
        .await
    }

    async fn get_all_keys(&self) -> Result<BTreeSet<CacheKey>, CacheError> {
        self.read(|table| {
            let Some(table) = table else {
                return Ok(BTreeSet::new());
            };
            let mut keys = BTreeSet::new();
            for entry in table.iter().map_err(corrupted("iter"))? {
                let (key, _) = entry.map_err(corrupted("iter entry"))?;
                keys.insert(key.value().to_vec());
            }
            Ok(keys)
        })
        .await
    }

    async fn records_count(&self) -> Result<usize, CacheError> {
        // Table metadata: no value is read.
        self.read(|table| match table {
            Some(table) => Ok(table.len().map_err(corrupted("len"))? as usize),
            None => Ok(0),
        })
        .await
    }

    async fn delete(&self, key: &[u8]) -> Result<(), CacheError> {
        let db = Arc::clone(&self.db);
        let key = key.to_vec();

        tokio::task::spawn_blocking(move || -> Result<(), CacheError> {
            let txn = db
                .begin_write()
                .map_err(|e| CacheError::Backend(format!("write txn: {e}")))?;
            let existed;
            {
                let mut table = txn
                    .open_table(PAIRS_TABLE)
                    .map_err(|e| CacheError::Backend(format!("open table: {e}")))?;
                existed = table
                    .remove(key.as_slice())
                    .map_err(corrupted("remove"))?
                    .is_some();
            }
            if !existed {
                txn.abort().map_err(corrupted("abort"))?;
                return Err(CacheError::not_found(&key));
            }
            txn.commit()
                .map_err(|e| CacheError::Backend(format!("commit: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| CacheError::Backend(format!("task join: {e}")))?
    }

    async fn delete_data(&self) -> Result<(), CacheError> {
        let db = Arc::clone(&self.db);

        tokio::task::spawn_blocking(move || -> Result<(), CacheError> {
            let txn = db
                .begin_write()
                .map_err(|e| CacheError::Backend(format!("write txn: {e}")))?;
            let dropped = txn
                .delete_table(PAIRS_TABLE)
                .map_err(|e| CacheError::Backend(format!("delete table: {e}")))?;
            txn.commit()
                .map_err(|e| CacheError::Backend(format!("commit: {e}")))?;
            debug!(dropped, "cleared redb cache");
            Ok(())
        })
        .await
        .map_err(|e| CacheError::Backend(format!("task join: {e}")))?
    }

    async fn flush(&self) -> Result<(), CacheError> {
        // redb commits are durable by default: each write transaction is
        // fsynced on commit.
        Ok(())
    }

    fn name(&self) -> &str {
        "redb"
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cache error types for the SimStore cache contract.
//
// Two kinds of failure matter to callers: the key is absent (expected and
// recoverable), or the storage subsystem failed (I/O, corruption, lost
// backend). Everything except `NotFound` is a backend failure.

use thiserror::Error;

/// Errors that can occur when interacting with a cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The requested key was not found.
    #[error("key not found: {0}")]
    NotFound(String),

    /// The storage backend failed or is unreachable.
    #[error("backend error: {0}")]
    Backend(String),

    /// The stored data is corrupted or in an unexpected format.
    #[error("corrupted data: {0}")]
    CorruptedData(String),

    /// An I/O error occurred in the underlying storage layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Build a `NotFound` error for a raw key, rendering it readably.
    pub fn not_found(key: &[u8]) -> Self {
        CacheError::NotFound(String::from_utf8_lossy(key).into_owned())
    }

    /// True when the error means "key absent" rather than a backend failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }
}

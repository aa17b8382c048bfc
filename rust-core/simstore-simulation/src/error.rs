// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Errors raised by the simulation service.
//!
//! Per-pair problems during an import are not errors: they become warnings
//! on the [`SimulationImportResult`](crate::SimulationImportResult).

use simstore_cache::CacheError;
use thiserror::Error;

/// Simulation service errors
#[derive(Error, Debug)]
pub enum SimulationError {
    /// The cache failed; propagated unchanged.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The submitted document could not be parsed at all.
    #[error("malformed simulation document: {0}")]
    Malformed(String),

    /// A stored value is not a valid pair. Only this service writes values,
    /// so this is internal corruption.
    #[error("corrupted pair in cache: {0}")]
    CorruptedPair(String),

    #[error("invalid url pattern '{pattern}': {message}")]
    InvalidUrlPattern { pattern: String, message: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl SimulationError {
    /// True when the failure was caused by the caller's input rather than
    /// by the storage layer.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SimulationError::Malformed(_) | SimulationError::InvalidUrlPattern { .. }
        )
    }
}

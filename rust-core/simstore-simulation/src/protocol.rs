// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Import/export contract, independent of any transport.
//!
//! A successful import with no warnings answers with the full post-import
//! document. An import with warnings answers with the import result instead,
//! so the client checks what was actually stored. A refused document answers
//! with the result carrying `fatalError`.

use simstore_cache::Cache;

use crate::codec::{decode_document, encode_document};
use crate::error::SimulationError;
use crate::model::SimulationDocument;
use crate::result::SimulationImportResult;
use crate::store::SimulationStore;

/// How an import treats what is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Clear the store first (PUT).
    Override,
    /// Layer on top of existing pairs, replacing only colliding matchers (POST).
    Merge,
}

impl ImportMode {
    pub fn overrides_existing(self) -> bool {
        matches!(self, ImportMode::Override)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// Everything was stored; this is the store's content afterwards.
    Document(SimulationDocument),
    /// Stored with warnings.
    Warnings(SimulationImportResult),
    /// Nothing stored.
    Rejected(SimulationImportResult),
}

impl ImportOutcome {
    /// Serialized response body for this outcome.
    pub fn to_body(&self) -> Result<Vec<u8>, SimulationError> {
        match self {
            ImportOutcome::Document(document) => encode_document(document),
            ImportOutcome::Warnings(result) | ImportOutcome::Rejected(result) => {
                serde_json::to_vec_pretty(result)
                    .map_err(|e| SimulationError::Serialization(e.to_string()))
            }
        }
    }
}

impl<C: Cache + ?Sized> SimulationStore<C> {
    /// Decode `body` and import it.
    ///
    /// Unparsable input fails with [`SimulationError::Malformed`] before the
    /// store is touched.
    pub async fn import(
        &self,
        body: &[u8],
        mode: ImportMode,
    ) -> Result<ImportOutcome, SimulationError> {
        let document = decode_document(body)?;
        let result = self
            .put_simulation(document, mode.overrides_existing())
            .await?;

        if result.is_fatal() {
            return Ok(ImportOutcome::Rejected(result));
        }
        if result.has_warnings() {
            return Ok(ImportOutcome::Warnings(result));
        }
        Ok(ImportOutcome::Document(self.get_simulation().await?))
    }

    /// Export the stored simulation, filtered when `url_pattern` is given and
    /// non-empty.
    pub async fn export(&self, url_pattern: Option<&str>) -> Result<Vec<u8>, SimulationError> {
        let document = match url_pattern.filter(|p| !p.is_empty()) {
            Some(pattern) => self.get_filtered_simulation(pattern).await?,
            None => self.get_simulation().await?,
        };
        encode_document(&document)
    }
}

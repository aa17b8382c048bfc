// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Cache key derivation.
//!
//! The key is the hex SHA-256 of the request matcher's canonical JSON. Maps
//! in the model are `BTreeMap`s, so serialization order is stable, and
//! matcher kinds are lowercased first, so two equal matchers always produce
//! the same key.

use sha2::{Digest, Sha256};
use simstore_cache::CacheKey;

use crate::error::SimulationError;
use crate::model::RequestMatcher;

pub fn derive_key(request: &RequestMatcher) -> Result<CacheKey, SimulationError> {
    let mut request = request.clone();
    request.canonicalize_matcher_kinds();
    let canonical =
        serde_json::to_vec(&request).map_err(|e| SimulationError::Serialization(e.to_string()))?;
    let digest = Sha256::digest(&canonical);
    Ok(hex::encode(digest).into_bytes())
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! JSON codec for documents (wire format) and pairs (cache values).

use crate::error::SimulationError;
use crate::model::{SimulationDocument, SimulationPair};

/// Parse a submitted document. Any structural problem is a document-level
/// [`SimulationError::Malformed`].
pub fn decode_document(bytes: &[u8]) -> Result<SimulationDocument, SimulationError> {
    serde_json::from_slice(bytes).map_err(|e| SimulationError::Malformed(e.to_string()))
}

/// Render a document as pretty-printed JSON.
pub fn encode_document(document: &SimulationDocument) -> Result<Vec<u8>, SimulationError> {
    serde_json::to_vec_pretty(document).map_err(|e| SimulationError::Serialization(e.to_string()))
}

pub(crate) fn encode_pair(pair: &SimulationPair) -> Result<Vec<u8>, SimulationError> {
    serde_json::to_vec(pair).map_err(|e| SimulationError::Serialization(e.to_string()))
}

pub(crate) fn decode_pair(bytes: &[u8]) -> Result<SimulationPair, SimulationError> {
    serde_json::from_slice(bytes).map_err(|e| SimulationError::CorruptedPair(e.to_string()))
}

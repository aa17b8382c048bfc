// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Outcome of one import.

use serde::{Deserialize, Serialize};

/// Produced by every `put_simulation` call; never persisted.
///
/// `fatal_error` is set only when the whole document was refused, in which
/// case `accepted` is zero and nothing was committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationImportResult {
    pub accepted: usize,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,
}

impl SimulationImportResult {
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            fatal_error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal_error.is_some()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

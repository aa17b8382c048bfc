// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! URL-pattern filtering for exports.
//!
//! A pair's scheme-less URL is its first destination matcher value followed
//! by its first path matcher value (`api.example.com/users/1`). The pattern
//! is an unanchored regular expression searched within that string; use
//! `^` and `$` to anchor.

use regex::Regex;

use crate::error::SimulationError;
use crate::model::{FieldMatcher, RequestMatcher, SimulationPair};

#[derive(Debug, Clone)]
pub struct UrlFilter {
    pattern: Regex,
}

impl UrlFilter {
    pub fn new(pattern: &str) -> Result<Self, SimulationError> {
        let pattern = Regex::new(pattern).map_err(|e| SimulationError::InvalidUrlPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, pair: &SimulationPair) -> bool {
        self.pattern.is_match(&scheme_less_url(&pair.request))
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Destination and path of a request matcher joined as one string.
pub fn scheme_less_url(request: &RequestMatcher) -> String {
    fn first(matchers: &[FieldMatcher]) -> &str {
        matchers
            .first()
            .and_then(|m| m.value.as_deref())
            .unwrap_or_default()
    }
    format!("{}{}", first(&request.destination), first(&request.path))
}

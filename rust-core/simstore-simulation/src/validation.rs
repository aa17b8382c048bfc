// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Per-pair validation for imports.
//!
//! A pair is either rejected (skipped with a warning) or accepted, possibly
//! with advisories that are stored alongside it as warnings.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::model::{MatcherKind, SimulationPair};

/// Why a pair was skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PairRejection {
    #[error("{location} has unsupported field '{field}'")]
    UnsupportedField { location: String, field: String },

    #[error("request.{location} has no matcher")]
    MissingMatcher { location: String },

    #[error("request.{location} has no value")]
    MissingValue { location: String },

    #[error("request.{location} uses unsupported matcher '{kind}'")]
    UnsupportedMatcher { location: String, kind: String },

    #[error("request.{location} has an invalid regex: {message}")]
    InvalidRegex { location: String, message: String },

    #[error("response status {0} is not a valid HTTP status")]
    InvalidStatus(u16),

    #[error("response sets both body and bodyFile")]
    BodyAndBodyFile,
}

/// Check one pair. On success, returns advisories about questionable but
/// storable content.
pub fn validate_pair(pair: &SimulationPair) -> Result<Vec<String>, PairRejection> {
    reject_unknown(&pair.request.extra, "request")?;
    reject_unknown(&pair.response.extra, "response")?;

    for (location, field) in pair.request.field_matchers() {
        reject_unknown(&field.extra, &format!("request.{location}"))?;
        let Some(raw_kind) = field.matcher.as_deref() else {
            return Err(PairRejection::MissingMatcher { location });
        };
        let Some(value) = field.value.as_deref() else {
            return Err(PairRejection::MissingValue { location });
        };
        let kind: MatcherKind = raw_kind.parse().map_err(|_| PairRejection::UnsupportedMatcher {
            location: location.clone(),
            kind: raw_kind.to_string(),
        })?;
        if kind == MatcherKind::Regex {
            Regex::new(value).map_err(|e| PairRejection::InvalidRegex {
                location: location.clone(),
                message: e.to_string(),
            })?;
        }
    }

    let response = &pair.response;
    if !(100..=599).contains(&response.status) {
        return Err(PairRejection::InvalidStatus(response.status));
    }
    if response.body_file.is_some() && !response.body.is_empty() {
        return Err(PairRejection::BodyAndBodyFile);
    }

    Ok(advisories(pair))
}

fn reject_unknown(extra: &BTreeMap<String, Value>, location: &str) -> Result<(), PairRejection> {
    match extra.keys().next() {
        Some(field) => Err(PairRejection::UnsupportedField {
            location: location.to_string(),
            field: field.clone(),
        }),
        None => Ok(()),
    }
}

fn advisories(pair: &SimulationPair) -> Vec<String> {
    let mut notes = Vec::new();
    let response = &pair.response;

    // A literal body is the only case where the length is known up front.
    let literal_body = !response.templated && !response.encoded_body && response.body_file.is_none();
    if literal_body {
        let declared = response
            .headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, values)| values.first());
        if let Some(declared) = declared {
            match declared.trim().parse::<usize>() {
                Ok(len) if len == response.body.len() => {}
                Ok(len) => notes.push(format!(
                    "response Content-Length is {len} but the body is {} bytes",
                    response.body.len()
                )),
                Err(_) => notes.push(format!("response Content-Length '{declared}' is not a number")),
            }
        }
    }

    if response.fixed_delay > 0 && response.log_normal_delay.is_some() {
        notes.push("response sets both fixedDelay and logNormalDelay; logNormalDelay wins".to_string());
    }

    notes
}

/// Compile a delay rule's URL pattern.
pub fn compile_url_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(pattern)
}

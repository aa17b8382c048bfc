// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Simulation document model
//!
//! A simulation is an ordered list of request/response pairs plus global
//! delay rules, wrapped with version metadata. Field names on the wire are
//! camelCase.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::version::SchemaVersion;

/// Producer identity written into exported documents.
pub const PRODUCER_VERSION: &str = concat!("simstore-", env!("CARGO_PKG_VERSION"));

/// Top-level exchanged unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationDocument {
    pub data: SimulationData,
    pub meta: SimulationMeta,
}

impl SimulationDocument {
    /// Build a current-version document from pairs and global actions.
    pub fn new(pairs: Vec<SimulationPair>, global_actions: GlobalActions) -> Self {
        Self {
            data: SimulationData {
                pairs,
                global_actions,
            },
            meta: SimulationMeta::default(),
        }
    }

    /// Stamp the export time.
    pub fn exported_now(mut self) -> Self {
        self.meta.time_exported = Some(Utc::now());
        self
    }

    pub fn pairs(&self) -> &[SimulationPair] {
        &self.data.pairs
    }

    pub fn schema_version(&self) -> SchemaVersion {
        self.meta.schema_version
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationData {
    #[serde(default)]
    pub pairs: Vec<SimulationPair>,
    #[serde(default)]
    pub global_actions: GlobalActions,
}

/// Document metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationMeta {
    pub schema_version: SchemaVersion,
    /// Informational only.
    #[serde(rename = "hoverflyVersion", default)]
    pub producer_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_exported: Option<DateTime<Utc>>,
}

impl Default for SimulationMeta {
    fn default() -> Self {
        Self {
            schema_version: SchemaVersion::CURRENT,
            producer_version: PRODUCER_VERSION.to_string(),
            time_exported: None,
        }
    }
}

/// One recorded interaction: what to match and what to answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationPair {
    #[serde(default)]
    pub request: RequestMatcher,
    #[serde(default)]
    pub response: ResponseDetails,
}

impl SimulationPair {
    pub fn new(request: RequestMatcher, response: ResponseDetails) -> Self {
        Self { request, response }
    }
}

/// Request side of a pair. Every field is a list of matchers; an empty list
/// places no constraint on that part of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMatcher {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub method: Vec<FieldMatcher>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scheme: Vec<FieldMatcher>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination: Vec<FieldMatcher>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<FieldMatcher>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, Vec<FieldMatcher>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<FieldMatcher>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<FieldMatcher>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_state: Option<BTreeMap<String, String>>,
    /// Keys the model does not recognise. A pair carrying any is rejected
    /// during import, so this is empty for every stored pair.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RequestMatcher {
    pub fn with_method(mut self, matcher: FieldMatcher) -> Self {
        self.method.push(matcher);
        self
    }

    pub fn with_scheme(mut self, matcher: FieldMatcher) -> Self {
        self.scheme.push(matcher);
        self
    }

    pub fn with_destination(mut self, matcher: FieldMatcher) -> Self {
        self.destination.push(matcher);
        self
    }

    pub fn with_path(mut self, matcher: FieldMatcher) -> Self {
        self.path.push(matcher);
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, matcher: FieldMatcher) -> Self {
        self.query.entry(name.into()).or_default().push(matcher);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, matcher: FieldMatcher) -> Self {
        self.headers.entry(name.into()).or_default().push(matcher);
        self
    }

    pub fn with_body(mut self, matcher: FieldMatcher) -> Self {
        self.body.push(matcher);
        self
    }

    /// Rewrite recognised matcher kinds in their canonical lowercase
    /// spelling, so `EXACT` and `exact` describe the same matcher.
    pub fn canonicalize_matcher_kinds(&mut self) {
        let all = self
            .method
            .iter_mut()
            .chain(self.scheme.iter_mut())
            .chain(self.destination.iter_mut())
            .chain(self.path.iter_mut())
            .chain(self.body.iter_mut())
            .chain(self.query.values_mut().flatten())
            .chain(self.headers.values_mut().flatten());
        for field in all {
            if let Some(kind) = field
                .matcher
                .as_deref()
                .and_then(|raw| raw.parse::<MatcherKind>().ok())
            {
                field.matcher = Some(kind.as_str().to_string());
            }
        }
    }

    /// Visit every field matcher together with a readable location such as
    /// `path[0]` or `headers.Accept[1]`.
    pub fn field_matchers(&self) -> Vec<(String, &FieldMatcher)> {
        let mut out = Vec::new();
        let lists = [
            ("method", &self.method),
            ("scheme", &self.scheme),
            ("destination", &self.destination),
            ("path", &self.path),
            ("body", &self.body),
        ];
        for (field, matchers) in lists {
            for (i, m) in matchers.iter().enumerate() {
                out.push((format!("{field}[{i}]"), m));
            }
        }
        for (field, map) in [("query", &self.query), ("headers", &self.headers)] {
            for (name, matchers) in map {
                for (i, m) in matchers.iter().enumerate() {
                    out.push((format!("{field}.{name}[{i}]"), m));
                }
            }
        }
        out
    }
}

/// A single matcher: a kind (`exact`, `glob`, `regex`, ...) and its operand.
///
/// Both parts are optional on the wire so that an incomplete matcher is
/// reported against its pair instead of failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMatcher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Keys the model does not recognise. A pair carrying any is rejected
    /// during import, so this is empty for every stored pair.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl FieldMatcher {
    pub fn new(kind: MatcherKind, value: impl Into<String>) -> Self {
        Self {
            matcher: Some(kind.as_str().to_string()),
            value: Some(value.into()),
            extra: BTreeMap::new(),
        }
    }

    pub fn exact(value: impl Into<String>) -> Self {
        Self::new(MatcherKind::Exact, value)
    }

    pub fn glob(value: impl Into<String>) -> Self {
        Self::new(MatcherKind::Glob, value)
    }

    pub fn regex(value: impl Into<String>) -> Self {
        Self::new(MatcherKind::Regex, value)
    }
}

/// Matcher kinds the replay engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatcherKind {
    Exact,
    Glob,
    Regex,
    Xml,
    Xpath,
    Json,
    JsonPath,
    JsonPartial,
    Form,
    Array,
}

impl MatcherKind {
    pub const ALL: [MatcherKind; 10] = [
        MatcherKind::Exact,
        MatcherKind::Glob,
        MatcherKind::Regex,
        MatcherKind::Xml,
        MatcherKind::Xpath,
        MatcherKind::Json,
        MatcherKind::JsonPath,
        MatcherKind::JsonPartial,
        MatcherKind::Form,
        MatcherKind::Array,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MatcherKind::Exact => "exact",
            MatcherKind::Glob => "glob",
            MatcherKind::Regex => "regex",
            MatcherKind::Xml => "xml",
            MatcherKind::Xpath => "xpath",
            MatcherKind::Json => "json",
            MatcherKind::JsonPath => "jsonpath",
            MatcherKind::JsonPartial => "jsonpartial",
            MatcherKind::Form => "form",
            MatcherKind::Array => "array",
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatcherKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        MatcherKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| format!("unknown matcher '{s}'"))
    }
}

/// Response side of a pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDetails {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub encoded_body: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_file: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub templated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transitions_state: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removes_state: Vec<String>,
    /// Milliseconds.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub fixed_delay: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_normal_delay: Option<LogNormalDelay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_serve_action: Option<String>,
    /// Keys the model does not recognise. A pair carrying any is rejected
    /// during import, so this is empty for every stored pair.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ResponseDetails {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }
}

/// Log-normal delay parameters, all in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogNormalDelay {
    pub min: u64,
    pub max: u64,
    pub mean: u64,
    pub median: u64,
}

/// Directives that apply across pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalActions {
    #[serde(default)]
    pub delays: Vec<ResponseDelay>,
    #[serde(default)]
    pub delays_log_normal: Vec<ResponseDelayLogNormal>,
}

impl GlobalActions {
    pub fn is_empty(&self) -> bool {
        self.delays.is_empty() && self.delays_log_normal.is_empty()
    }

    pub fn clear(&mut self) {
        self.delays.clear();
        self.delays_log_normal.clear();
    }
}

/// Fixed delay for every response whose URL matches `url_pattern`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDelay {
    pub url_pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    /// Milliseconds.
    pub delay: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDelayLogNormal {
    pub url_pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    pub min: u64,
    pub max: u64,
    pub mean: u64,
    pub median: u64,
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

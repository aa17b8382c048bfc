// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Machine-readable descriptor of the current document schema.
//!
//! Served read-only so tooling can check documents before submitting them.
//! It lists exactly the fields the model in [`crate::model`] reads and
//! writes at [`SchemaVersion::CURRENT`].

use std::sync::OnceLock;

use serde_json::{json, Value};

use crate::model::MatcherKind;
use crate::version::SchemaVersion;

static DESCRIPTOR: OnceLock<Value> = OnceLock::new();

/// The descriptor for [`SchemaVersion::CURRENT`].
pub fn schema_descriptor() -> &'static Value {
    DESCRIPTOR.get_or_init(build_descriptor)
}

fn build_descriptor() -> Value {
    let matcher_pattern = matcher_kind_pattern();

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Simulation",
        "description": format!("Simulation document, schema {}", SchemaVersion::CURRENT),
        "type": "object",
        "required": ["data", "meta"],
        "additionalProperties": false,
        "properties": {
            "data": {
                "type": "object",
                "required": ["pairs"],
                "additionalProperties": false,
                "properties": {
                    "pairs": {
                        "type": "array",
                        "items": { "$ref": "#/definitions/request-response-pair" }
                    },
                    "globalActions": { "$ref": "#/definitions/global-actions" }
                }
            },
            "meta": {
                "type": "object",
                "required": ["schemaVersion"],
                "additionalProperties": false,
                "properties": {
                    "schemaVersion": {
                        "type": ["string", "integer"],
                        "pattern": "^[vV]?[0-9]+$",
                        "minimum": 0
                    },
                    "hoverflyVersion": { "type": "string" },
                    "timeExported": { "type": "string", "format": "date-time" }
                }
            }
        },
        "definitions": {
            "request-response-pair": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "request": { "$ref": "#/definitions/request" },
                    "response": { "$ref": "#/definitions/response" }
                }
            },
            "request": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "method": { "$ref": "#/definitions/field-matchers" },
                    "scheme": { "$ref": "#/definitions/field-matchers" },
                    "destination": { "$ref": "#/definitions/field-matchers" },
                    "path": { "$ref": "#/definitions/field-matchers" },
                    "query": { "$ref": "#/definitions/field-matcher-map" },
                    "headers": { "$ref": "#/definitions/field-matcher-map" },
                    "body": { "$ref": "#/definitions/field-matchers" },
                    "requiresState": { "$ref": "#/definitions/string-map" }
                }
            },
            "field-matchers": {
                "type": "array",
                "items": { "$ref": "#/definitions/field-matcher" }
            },
            "field-matcher": {
                "type": "object",
                "required": ["matcher", "value"],
                "additionalProperties": false,
                "properties": {
                    "matcher": { "type": "string", "pattern": matcher_pattern },
                    "value": { "type": "string" }
                }
            },
            "field-matcher-map": {
                "type": "object",
                "additionalProperties": { "$ref": "#/definitions/field-matchers" }
            },
            "string-map": {
                "type": "object",
                "additionalProperties": { "type": "string" }
            },
            "response": {
                "type": "object",
                "required": ["status"],
                "additionalProperties": false,
                "properties": {
                    "status": { "type": "integer", "minimum": 100, "maximum": 599 },
                    "body": { "type": "string" },
                    "encodedBody": { "type": "boolean" },
                    "bodyFile": { "type": "string" },
                    "headers": {
                        "type": "object",
                        "additionalProperties": { "type": "array", "items": { "type": "string" } }
                    },
                    "templated": { "type": "boolean" },
                    "transitionsState": { "$ref": "#/definitions/string-map" },
                    "removesState": { "type": "array", "items": { "type": "string" } },
                    "fixedDelay": { "type": "integer", "minimum": 0 },
                    "logNormalDelay": { "$ref": "#/definitions/log-normal-delay" },
                    "postServeAction": { "type": "string" }
                }
            },
            "log-normal-delay": {
                "type": "object",
                "required": ["min", "max", "mean", "median"],
                "additionalProperties": false,
                "properties": {
                    "min": { "type": "integer", "minimum": 0 },
                    "max": { "type": "integer", "minimum": 0 },
                    "mean": { "type": "integer", "minimum": 0 },
                    "median": { "type": "integer", "minimum": 0 }
                }
            },
            "global-actions": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "delays": { "type": "array", "items": { "$ref": "#/definitions/delay" } },
                    "delaysLogNormal": {
                        "type": "array",
                        "items": { "$ref": "#/definitions/delay-log-normal" }
                    }
                }
            },
            "delay": {
                "type": "object",
                "required": ["urlPattern", "delay"],
                "additionalProperties": false,
                "properties": {
                    "urlPattern": { "type": "string" },
                    "httpMethod": { "type": "string" },
                    "delay": { "type": "integer", "minimum": 0 }
                }
            },
            "delay-log-normal": {
                "type": "object",
                "required": ["urlPattern", "min", "max", "mean", "median"],
                "additionalProperties": false,
                "properties": {
                    "urlPattern": { "type": "string" },
                    "httpMethod": { "type": "string" },
                    "min": { "type": "integer", "minimum": 0 },
                    "max": { "type": "integer", "minimum": 0 },
                    "mean": { "type": "integer", "minimum": 0 },
                    "median": { "type": "integer", "minimum": 0 }
                }
            }
        }
    })
}

/// Matcher kinds are read case-insensitively, so each letter admits both
/// cases: `exact` becomes `[eE][xX][aA][cC][tT]`.
fn matcher_kind_pattern() -> String {
    let alternatives: Vec<String> = MatcherKind::ALL
        .iter()
        .map(|kind| {
            kind.as_str()
                .chars()
                .map(|c| format!("[{}{}]", c, c.to_ascii_uppercase()))
                .collect()
        })
        .collect();
    format!("^(?:{})$", alternatives.join("|"))
}

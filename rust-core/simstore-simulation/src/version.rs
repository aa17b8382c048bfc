// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Document schema versions and the upgrade hook for older documents.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::SimulationDocument;

/// Monotonically increasing document schema version.
///
/// Written on the wire as `"v6"`; a bare integer is accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaVersion(pub u32);

impl SchemaVersion {
    /// The version this service reads and writes.
    pub const CURRENT: SchemaVersion = SchemaVersion(6);

    /// Oldest version that can still be upgraded.
    pub const OLDEST_SUPPORTED: SchemaVersion = SchemaVersion(1);

    pub fn is_current(self) -> bool {
        self == Self::CURRENT
    }

    /// True for versions older than current that the upgrade hook accepts.
    pub fn is_upgradable(self) -> bool {
        self >= Self::OLDEST_SUPPORTED && self < Self::CURRENT
    }

    /// Parse `"v6"`, `"V6"` or `"6"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits = raw
            .strip_prefix('v')
            .or_else(|| raw.strip_prefix('V'))
            .unwrap_or(raw);
        digits.parse().ok().map(SchemaVersion)
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VersionVisitor;

        impl Visitor<'_> for VersionVisitor {
            type Value = SchemaVersion;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a schema version such as \"v6\" or 6")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<SchemaVersion, E> {
                u32::try_from(v)
                    .map(SchemaVersion)
                    .map_err(|_| E::custom(format!("schema version {v} out of range")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<SchemaVersion, E> {
                u32::try_from(v)
                    .map(SchemaVersion)
                    .map_err(|_| E::custom(format!("schema version {v} out of range")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<SchemaVersion, E> {
                SchemaVersion::parse(v)
                    .ok_or_else(|| E::custom(format!("invalid schema version '{v}'")))
            }
        }

        deserializer.deserialize_any(VersionVisitor)
    }
}

/// Upgrade step applied to documents written at an older schema version.
///
/// Called only for versions where [`SchemaVersion::is_upgradable`] holds.
/// The returned document must carry [`SchemaVersion::CURRENT`].
pub trait SchemaMigration: Send + Sync {
    fn migrate(&self, document: SimulationDocument) -> Result<SimulationDocument, String>;
}

/// Default upgrade: older shapes decode into the current model unchanged, so
/// only the version label moves forward.
#[derive(Debug, Clone, Copy, Default)]
pub struct StampCurrentVersion;

impl SchemaMigration for StampCurrentVersion {
    fn migrate(&self, mut document: SimulationDocument) -> Result<SimulationDocument, String> {
        document.meta.schema_version = SchemaVersion::CURRENT;
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(SchemaVersion::parse("v6"), Some(SchemaVersion(6)));
        assert_eq!(SchemaVersion::parse("V3"), Some(SchemaVersion(3)));
        assert_eq!(SchemaVersion::parse("12"), Some(SchemaVersion(12)));
        assert_eq!(SchemaVersion::parse("v"), None);
        assert_eq!(SchemaVersion::parse("six"), None);
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&SchemaVersion::CURRENT).unwrap();
        assert_eq!(json, "\"v6\"");

        let from_str: SchemaVersion = serde_json::from_str("\"v5\"").unwrap();
        let from_int: SchemaVersion = serde_json::from_str("5").unwrap();
        assert_eq!(from_str, from_int);

        assert!(serde_json::from_str::<SchemaVersion>("\"latest\"").is_err());
        assert!(serde_json::from_str::<SchemaVersion>("-1").is_err());
    }

    #[test]
    fn test_support_window() {
        assert!(SchemaVersion::CURRENT.is_current());
        assert!(!SchemaVersion::CURRENT.is_upgradable());
        assert!(SchemaVersion(1).is_upgradable());
        assert!(SchemaVersion(5).is_upgradable());
        assert!(!SchemaVersion(0).is_upgradable());
        assert!(!SchemaVersion(7).is_upgradable());
    }

    #[test]
    fn test_stamp_current_version() {
        let mut document = SimulationDocument::default();
        document.meta.schema_version = SchemaVersion(4);

        let upgraded = StampCurrentVersion.migrate(document).unwrap();
        assert_eq!(upgraded.meta.schema_version, SchemaVersion::CURRENT);
    }
}

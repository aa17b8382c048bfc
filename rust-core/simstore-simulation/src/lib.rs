// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! SimStore Simulation
//!
//! Versioned simulation documents and the service that stores them in a
//! [`Cache`](simstore_cache::Cache). A simulation is a set of recorded HTTP
//! request/response pairs plus global delay rules; it is imported and
//! exported as one JSON document.
//!
//! ```rust
//! use std::sync::Arc;
//! use simstore_cache::InMemoryCache;
//! use simstore_simulation::{
//!     FieldMatcher, GlobalActions, RequestMatcher, ResponseDetails, SimulationDocument,
//!     SimulationPair, SimulationStore,
//! };
//!
//! # tokio_test::block_on(async {
//! let store = SimulationStore::new(Arc::new(InMemoryCache::new()));
//! let pair = SimulationPair::new(
//!     RequestMatcher::default().with_path(FieldMatcher::exact("/health")),
//!     ResponseDetails::new(200, "ok"),
//! );
//!
//! let result = store
//!     .put_simulation(SimulationDocument::new(vec![pair], GlobalActions::default()), true)
//!     .await
//!     .unwrap();
//! assert_eq!(result.accepted, 1);
//! assert_eq!(store.get_simulation().await.unwrap().pairs().len(), 1);
//! # });
//! ```

pub mod codec;
pub mod error;
pub mod filter;
pub mod key;
pub mod model;
pub mod protocol;
pub mod result;
pub mod schema;
pub mod store;
pub mod validation;
pub mod version;

pub use codec::{decode_document, encode_document};
pub use error::SimulationError;
pub use filter::UrlFilter;
pub use model::{
    FieldMatcher, GlobalActions, LogNormalDelay, MatcherKind, RequestMatcher, ResponseDelay,
    ResponseDelayLogNormal, ResponseDetails, SimulationData, SimulationDocument, SimulationMeta,
    SimulationPair, PRODUCER_VERSION,
};
pub use protocol::{ImportMode, ImportOutcome};
pub use result::SimulationImportResult;
pub use schema::schema_descriptor;
pub use store::SimulationStore;
pub use validation::PairRejection;
pub use version::{SchemaMigration, SchemaVersion, StampCurrentVersion};

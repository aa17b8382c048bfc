// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Simulation store service
//!
//! Maps between raw cache entries and simulation documents. The cache is
//! injected at construction; nothing here is process-global.
//!
//! # Consistency
//!
//! Each cache call is atomic on its own, but an import is a sequence of
//! calls. With `override_existing`, the store is cleared before the first
//! pair is written, so a concurrent reader can observe an empty (or
//! partially re-populated) simulation while an import is in flight. Readers
//! are not promised a snapshot across an import.

use std::collections::HashSet;
use std::sync::Arc;

use simstore_cache::Cache;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::codec::{decode_pair, encode_pair};
use crate::error::SimulationError;
use crate::filter::UrlFilter;
use crate::key::derive_key;
use crate::model::{GlobalActions, SimulationDocument, SimulationPair};
use crate::result::SimulationImportResult;
use crate::validation::{compile_url_pattern, validate_pair};
use crate::version::{SchemaMigration, SchemaVersion, StampCurrentVersion};

/// Store service over one injected cache.
///
/// Pairs live in the cache. Global actions are process state held by the
/// service itself and are rebuilt by imports.
pub struct SimulationStore<C: Cache + ?Sized> {
    cache: Arc<C>,
    global_actions: RwLock<GlobalActions>,
    migration: Box<dyn SchemaMigration>,
}

impl<C: Cache + ?Sized> SimulationStore<C> {
    /// Create a service over `cache`, upgrading older documents with
    /// [`StampCurrentVersion`].
    pub fn new(cache: Arc<C>) -> Self {
        Self {
            cache,
            global_actions: RwLock::new(GlobalActions::default()),
            migration: Box::new(StampCurrentVersion),
        }
    }

    /// Replace the upgrade hook used for older schema versions.
    pub fn with_migration(mut self, migration: impl SchemaMigration + 'static) -> Self {
        self.migration = Box::new(migration);
        self
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Every stored pair as a current-version document, ordered by key.
    #[instrument(skip(self), fields(backend = self.cache.name()))]
    pub async fn get_simulation(&self) -> Result<SimulationDocument, SimulationError> {
        let pairs = self.load_pairs().await?;
        debug!(pairs = pairs.len(), "loaded simulation");
        Ok(self.assemble(pairs).await)
    }

    /// Like [`get_simulation`](Self::get_simulation) but keeping only pairs
    /// whose scheme-less URL matches `url_pattern` (see [`UrlFilter`]).
    #[instrument(skip(self), fields(backend = self.cache.name()))]
    pub async fn get_filtered_simulation(
        &self,
        url_pattern: &str,
    ) -> Result<SimulationDocument, SimulationError> {
        let filter = UrlFilter::new(url_pattern)?;
        let pairs: Vec<SimulationPair> = self
            .load_pairs()
            .await?
            .into_iter()
            .filter(|pair| filter.matches(pair))
            .collect();
        debug!(pairs = pairs.len(), "filtered simulation");
        Ok(self.assemble(pairs).await)
    }

    /// Import `document`.
    ///
    /// An unsupported schema version yields a fatal result and leaves the
    /// store untouched. Otherwise invalid pairs are skipped with a warning
    /// and the rest are committed. Cache failures abort the import and are
    /// returned as errors; pairs written before the failure stay written.
    #[instrument(
        skip(self, document),
        fields(pairs = document.data.pairs.len(), version = %document.meta.schema_version)
    )]
    pub async fn put_simulation(
        &self,
        document: SimulationDocument,
        override_existing: bool,
    ) -> Result<SimulationImportResult, SimulationError> {
        let document = match self.upgrade(document) {
            Ok(document) => document,
            Err(reason) => {
                warn!(%reason, "rejected simulation");
                return Ok(SimulationImportResult::fatal(reason));
            }
        };

        if override_existing {
            self.cache.delete_data().await?;
            self.global_actions.write().await.clear();
        }

        let mut result = SimulationImportResult::default();
        let mut seen_keys = HashSet::new();

        for (index, mut pair) in document.data.pairs.into_iter().enumerate() {
            let advisories = match validate_pair(&pair) {
                Ok(advisories) => advisories,
                Err(rejection) => {
                    warn!(index, %rejection, "skipping invalid pair");
                    result.warn(format!("pair {index}: skipped: {rejection}"));
                    continue;
                }
            };

            pair.request.canonicalize_matcher_kinds();
            let key = derive_key(&pair.request)?;
            self.cache.set(&key, &encode_pair(&pair)?).await?;
            result.accepted += 1;
            debug!(index, key = %String::from_utf8_lossy(&key), "stored pair");

            if !seen_keys.insert(key) {
                result.warn(format!(
                    "pair {index}: request matcher repeats an earlier pair in this document and replaced it"
                ));
            }
            for advisory in advisories {
                result.warn(format!("pair {index}: {advisory}"));
            }
        }

        self.import_global_actions(document.data.global_actions, &mut result)
            .await;

        info!(
            accepted = result.accepted,
            warnings = result.warnings.len(),
            override_existing,
            "imported simulation"
        );
        Ok(result)
    }

    /// Remove every pair and global action. Cache failures are returned.
    #[instrument(skip(self), fields(backend = self.cache.name()))]
    pub async fn delete_simulation(&self) -> Result<(), SimulationError> {
        self.cache.delete_data().await?;
        self.global_actions.write().await.clear();
        info!("deleted simulation");
        Ok(())
    }

    async fn load_pairs(&self) -> Result<Vec<SimulationPair>, SimulationError> {
        self.cache
            .get_all_values()
            .await?
            .iter()
            .map(|value| decode_pair(value))
            .collect()
    }

    async fn assemble(&self, pairs: Vec<SimulationPair>) -> SimulationDocument {
        let global_actions = self.global_actions.read().await.clone();
        SimulationDocument::new(pairs, global_actions).exported_now()
    }

    fn upgrade(&self, document: SimulationDocument) -> Result<SimulationDocument, String> {
        let version = document.meta.schema_version;
        if version.is_current() {
            return Ok(document);
        }
        if !version.is_upgradable() {
            return Err(format!(
                "unsupported schema version {version}; supported versions are {} to {}",
                SchemaVersion::OLDEST_SUPPORTED,
                SchemaVersion::CURRENT
            ));
        }

        let upgraded = self
            .migration
            .migrate(document)
            .map_err(|e| format!("failed to upgrade schema {version}: {e}"))?;
        if !upgraded.meta.schema_version.is_current() {
            return Err(format!(
                "upgrade from {version} produced {} instead of {}",
                upgraded.meta.schema_version,
                SchemaVersion::CURRENT
            ));
        }
        debug!(from = %version, "upgraded simulation schema");
        Ok(upgraded)
    }

    async fn import_global_actions(
        &self,
        incoming: GlobalActions,
        result: &mut SimulationImportResult,
    ) {
        if incoming.is_empty() {
            return;
        }

        let mut actions = self.global_actions.write().await;
        for (index, delay) in incoming.delays.into_iter().enumerate() {
            match compile_url_pattern(&delay.url_pattern) {
                Ok(_) => actions.delays.push(delay),
                Err(e) => {
                    warn!(index, pattern = %delay.url_pattern, "skipping invalid delay");
                    result.warn(format!("delay {index}: skipped: invalid urlPattern: {e}"));
                }
            }
        }
        for (index, delay) in incoming.delays_log_normal.into_iter().enumerate() {
            if delay.min > delay.max {
                result.warn(format!(
                    "log-normal delay {index}: skipped: min {} exceeds max {}",
                    delay.min, delay.max
                ));
                continue;
            }
            match compile_url_pattern(&delay.url_pattern) {
                Ok(_) => actions.delays_log_normal.push(delay),
                Err(e) => {
                    warn!(index, pattern = %delay.url_pattern, "skipping invalid log-normal delay");
                    result.warn(format!(
                        "log-normal delay {index}: skipped: invalid urlPattern: {e}"
                    ));
                }
            }
        }
    }
}

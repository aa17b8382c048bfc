// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Server configuration, read from `SIMSTORE_*` environment variables.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use simstore_cache::{Cache, CacheError, InMemoryCache};
use thiserror::Error;

pub const ENV_HOST: &str = "SIMSTORE_HOST";
pub const ENV_PORT: &str = "SIMSTORE_PORT";
pub const ENV_DB_PATH: &str = "SIMSTORE_DB_PATH";
pub const ENV_AUTH_TOKEN: &str = "SIMSTORE_AUTH_TOKEN";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var}: {message}")]
    InvalidValue { var: &'static str, message: String },

    #[error("persistent backend requested at {0} but the `persistent` feature is not enabled")]
    PersistenceUnavailable(PathBuf),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Where simulation pairs are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    #[default]
    InMemory,
    Redb { path: PathBuf },
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Cache backend
    pub backend: BackendConfig,
    /// Bearer token for mutating requests; `None` disables auth.
    #[serde(skip_serializing, default)]
    pub auth_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8500,
            backend: BackendConfig::InMemory,
            auth_token: None,
        }
    }
}

impl ApiConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overlaid with whatever `lookup` yields. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get(ENV_HOST) {
            config.host = host;
        }
        if let Some(port) = get(ENV_PORT) {
            config.port = port
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                    var: ENV_PORT,
                    message: format!("{port:?}: {e}"),
                })?;
        }
        if let Some(path) = get(ENV_DB_PATH) {
            config.backend = BackendConfig::Redb {
                path: PathBuf::from(path),
            };
        }
        config.auth_token = get(ENV_AUTH_TOKEN);

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Open the cache described by `backend`.
pub fn open_cache(backend: &BackendConfig) -> Result<Arc<dyn Cache>, ConfigError> {
    match backend {
        BackendConfig::InMemory => Ok(Arc::new(InMemoryCache::new())),
        #[cfg(feature = "persistent")]
        BackendConfig::Redb { path } => Ok(Arc::new(simstore_cache::RedbCache::open(path)?)),
        #[cfg(not(feature = "persistent"))]
        BackendConfig::Redb { path } => Err(ConfigError::PersistenceUnavailable(path.clone())),
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! SimStore API server binary
//!
//! Configured through `SIMSTORE_HOST`, `SIMSTORE_PORT`, `SIMSTORE_DB_PATH`
//! and `SIMSTORE_AUTH_TOKEN`.

use simstore_api::ApiConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ApiConfig::from_env()?;

    tracing::info!(
        backend = ?config.backend,
        "Starting SimStore API server on {}:{}",
        config.host,
        config.port
    );

    simstore_api::serve(config).await?;

    Ok(())
}

//! Application setup and initialization
//!
//! Kept out of main.rs so tests can build the same router over fake backends.

pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use shelfshot_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        "Configuration loaded and validated successfully"
    );

    let backends = storage::setup_storage(&config).await?;
    let state = Arc::new(AppState::new(config.clone(), backends));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

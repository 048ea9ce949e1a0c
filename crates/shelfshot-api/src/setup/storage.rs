//! Storage setup and initialization

use anyhow::{Context, Result};
use shelfshot_core::Config;
use shelfshot_storage::{create_backends, Backends};

/// Build both storage backends and make sure the disk buffer directory exists.
pub async fn setup_storage(config: &Config) -> Result<Backends> {
    let upload_dir = &config.upload.upload_dir;
    tokio::fs::create_dir_all(upload_dir)
        .await
        .with_context(|| format!("Failed to create upload directory {}", upload_dir.display()))?;

    tracing::info!("Initializing storage backends...");
    let backends = create_backends(config).context("Failed to create storage backends")?;
    tracing::info!(
        cdn = %backends.cdn.kind(),
        object_store = %backends.object_store.kind(),
        bucket = %config.object_store.bucket,
        upload_dir = %upload_dir.display(),
        "Storage backends initialized successfully"
    );

    Ok(backends)
}

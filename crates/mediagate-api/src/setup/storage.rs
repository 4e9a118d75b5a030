//! Storage setup

use anyhow::{Context, Result};
use mediagate_core::Config;
use mediagate_storage::Storage;
use std::sync::Arc;

/// Build the configured storage backend.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = mediagate_storage::create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(backend = ?storage.backend_type(), "Storage initialized");
    Ok(storage)
}

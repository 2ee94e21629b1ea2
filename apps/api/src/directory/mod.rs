//! Read-only search over the legacy SQLite professional directory.

pub mod handlers;
pub mod store;

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::info;

/// Opens the directory file read-only. The file is never created or migrated here.
pub async fn open(path: &Path) -> Result<SqlitePool> {
    let url = format!("sqlite:{}?mode=ro", path.display());
    let pool = SqlitePool::connect(&url)
        .await
        .with_context(|| format!("Failed to open directory database: {}", path.display()))?;
    info!("Directory database opened: {}", path.display());
    Ok(pool)
}

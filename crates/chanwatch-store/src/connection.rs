//! `SQLite` connection pool setup.

use crate::error::{Result, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Path that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Open a connection pool for the database at `path`, creating the file
/// (and its parent directory) if missing.
///
/// An in-memory database lives only as long as its connection, so the pool
/// is pinned to a single connection that is never recycled.
pub async fn connect(path: impl AsRef<Path>) -> Result<Pool<Sqlite>> {
    let path = path.as_ref();
    let path_str = path
        .to_str()
        .ok_or_else(|| StoreError::Open("invalid database path: not valid UTF-8".to_string()))?;
    let in_memory = path_str == IN_MEMORY;

    if !in_memory {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let connect_options = SqliteConnectOptions::from_str(path_str)
        .map_err(|e| StoreError::Open(format!("invalid connection string: {e}")))?
        .create_if_missing(true);

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options
        .connect_with(connect_options)
        .await
        .map_err(|e| StoreError::Open(format!("failed to initialize pool: {e}")))?;

    tracing::info!("Cursor database pool created at {}", path_str);
    Ok(pool)
}

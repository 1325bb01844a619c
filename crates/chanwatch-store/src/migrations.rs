//! Database migration management.
//!
//! Embeds SQL migrations and provides functions to apply them automatically.
//! Uses `SQLx`'s built-in migration support with compile-time embedding.

use crate::error::{Result, StoreError};
use sqlx::{Pool, Sqlite};

/// Run all pending database migrations.
///
/// Applied migrations are tracked by `SQLx` in the `_sqlx_migrations` table.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    tracing::debug!("Running cursor store migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Migration(format!("migration execution failed: {e}")))?;

    Ok(())
}

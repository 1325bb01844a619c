//! `SQLite`-backed cursor storage.
//!
//! One row per scan key in the `scan_cursors` table; saves are upserts so a
//! single statement replaces the previous cursor atomically.

use crate::connection::{connect, IN_MEMORY};
use crate::error::Result;
use crate::migrations::run_migrations;
use crate::CursorStore;
use async_trait::async_trait;
use chanwatch_core::{ScanCursor, ScanKey};
use sqlx::SqlitePool;
use std::path::Path;

/// Store a cursor for a scan key, replacing any previous value.
pub async fn set_cursor(pool: &SqlitePool, scan_key: &str, cursor: &str) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO scan_cursors (scan_key, cursor, updated_at)
        VALUES (?, ?, datetime('now'))
        ON CONFLICT(scan_key) DO UPDATE SET
            cursor = excluded.cursor,
            updated_at = datetime('now')
        ",
    )
    .bind(scan_key)
    .bind(cursor)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get the cursor stored for a scan key.
pub async fn get_cursor(pool: &SqlitePool, scan_key: &str) -> Result<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as(
        r"
        SELECT cursor
        FROM scan_cursors
        WHERE scan_key = ?
        ",
    )
    .bind(scan_key)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(cursor,)| cursor))
}

/// Delete the cursor for a scan key. Deleting a missing key is a no-op.
pub async fn delete_cursor(pool: &SqlitePool, scan_key: &str) -> Result<()> {
    sqlx::query(
        r"
        DELETE FROM scan_cursors
        WHERE scan_key = ?
        ",
    )
    .bind(scan_key)
    .execute(pool)
    .await?;

    Ok(())
}

/// Cursor store on a local `SQLite` database.
#[derive(Debug, Clone)]
pub struct SqliteCursorStore {
    pool: SqlitePool,
}

impl SqliteCursorStore {
    /// Open (or create) the database at `path` and apply migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let pool = connect(path).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        Self::open(IN_MEMORY).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the pool, waiting for connections to be released.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CursorStore for SqliteCursorStore {
    async fn load(&self, key: &ScanKey) -> Result<Option<ScanCursor>> {
        let cursor = get_cursor(&self.pool, key.as_str()).await?;
        tracing::debug!(scan_key = %key, found = cursor.is_some(), "Cursor loaded");
        Ok(cursor.map(ScanCursor::new))
    }

    async fn save(&self, key: &ScanKey, cursor: &ScanCursor) -> Result<()> {
        set_cursor(&self.pool, key.as_str(), cursor.as_str()).await?;
        tracing::debug!(scan_key = %key, "Cursor saved");
        Ok(())
    }

    async fn clear(&self, key: &ScanKey) -> Result<()> {
        delete_cursor(&self.pool, key.as_str()).await?;
        tracing::debug!(scan_key = %key, "Cursor cleared");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

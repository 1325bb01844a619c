//! Chanwatch Cursor Store
//!
//! Persists the opaque pagination cursor of a scan between runs, keyed by
//! the scan's [`ScanKey`]. The store never interprets cursor values.
//!
//! # Backends
//!
//! - [`MemoryCursorStore`] - process-local map, used by tests and dry runs
//! - [`SqliteCursorStore`] - `SQLite` file via `SQLx`, with an embedded migration
//! - [`RedisCursorStore`] - Redis server via an auto-reconnecting connection manager
//!
//! # Example
//!
//! ```ignore
//! use chanwatch_store::{CursorStore, SqliteCursorStore};
//!
//! let store = SqliteCursorStore::open("cursors.db").await?;
//! store.save(&scan_key, &cursor).await?;
//! assert_eq!(store.load(&scan_key).await?, Some(cursor));
//! ```
//!
//! # Concurrency
//!
//! Every backend provides last-writer-wins semantics on a single key and
//! nothing more. Callers must ensure at most one scan runs per key.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod cursors;
pub mod error;
pub mod memory;
pub mod migrations;
pub mod redis_store;

// Re-export commonly used types
pub use cursors::SqliteCursorStore;
pub use error::{Result, StoreError};
pub use memory::MemoryCursorStore;
pub use redis_store::RedisCursorStore;

use async_trait::async_trait;
use chanwatch_core::{ScanCursor, ScanKey};
use std::sync::Arc;

/// Durable storage for scan resume cursors.
///
/// Implementations must be thread-safe (Send + Sync) so a single store can
/// be shared by the scan engine and operator commands.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Load the cursor stored for `key`.
    ///
    /// Returns `Ok(None)` when nothing is stored; errors only when the
    /// backend cannot be reached.
    async fn load(&self, key: &ScanKey) -> Result<Option<ScanCursor>>;

    /// Store `cursor` for `key`, replacing any previous value.
    async fn save(&self, key: &ScanKey, cursor: &ScanCursor) -> Result<()>;

    /// Remove the cursor for `key`. Clearing a missing key succeeds.
    async fn clear(&self, key: &ScanKey) -> Result<()>;

    /// Short backend name used in logs and errors.
    fn backend(&self) -> &'static str;
}

#[async_trait]
impl<T: CursorStore + ?Sized> CursorStore for Arc<T> {
    async fn load(&self, key: &ScanKey) -> Result<Option<ScanCursor>> {
        (**self).load(key).await
    }

    async fn save(&self, key: &ScanKey, cursor: &ScanCursor) -> Result<()> {
        (**self).save(key, cursor).await
    }

    async fn clear(&self, key: &ScanKey) -> Result<()> {
        (**self).clear(key).await
    }

    fn backend(&self) -> &'static str {
        (**self).backend()
    }
}

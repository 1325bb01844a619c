//! In-memory cursor store.

use crate::error::Result;
use crate::CursorStore;
use async_trait::async_trait;
use chanwatch_core::{ScanCursor, ScanKey};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Cursor store backed by a process-local map. Cursors are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    cursors: RwLock<HashMap<ScanKey, ScanCursor>>,
}

impl MemoryCursorStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with one cursor.
    #[must_use]
    pub fn with_cursor(key: ScanKey, cursor: ScanCursor) -> Self {
        let cursors = HashMap::from([(key, cursor)]);
        Self {
            cursors: RwLock::new(cursors),
        }
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    async fn load(&self, key: &ScanKey) -> Result<Option<ScanCursor>> {
        Ok(self.cursors.read().await.get(key).cloned())
    }

    async fn save(&self, key: &ScanKey, cursor: &ScanCursor) -> Result<()> {
        self.cursors
            .write()
            .await
            .insert(key.clone(), cursor.clone());
        Ok(())
    }

    async fn clear(&self, key: &ScanKey) -> Result<()> {
        self.cursors.write().await.remove(key);
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_and_clear() {
        let store = MemoryCursorStore::new();
        let key = ScanKey::new("audit").expect("valid key");

        assert_eq!(store.load(&key).await.expect("load"), None);

        store
            .save(&key, &ScanCursor::new("page-2"))
            .await
            .expect("save");
        assert_eq!(
            store.load(&key).await.expect("load"),
            Some(ScanCursor::new("page-2"))
        );

        store.clear(&key).await.expect("clear");
        store.clear(&key).await.expect("clear again");
        assert_eq!(store.load(&key).await.expect("load"), None);
    }

    #[tokio::test]
    async fn test_seeded_store() {
        let key = ScanKey::new("audit").expect("valid key");
        let store = MemoryCursorStore::with_cursor(key.clone(), ScanCursor::new("seed"));
        assert_eq!(
            store.load(&key).await.expect("load"),
            Some(ScanCursor::new("seed"))
        );
    }
}

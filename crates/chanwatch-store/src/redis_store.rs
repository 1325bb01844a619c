//! Redis-backed cursor store.

use crate::error::Result;
use crate::CursorStore;
use async_trait::async_trait;
use chanwatch_core::{ScanCursor, ScanKey};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::fmt;

/// Prefix for every cursor key written to Redis.
pub const KEY_PREFIX: &str = "chanwatch:cursor:";

/// Cursor store on a Redis server.
///
/// Uses a `ConnectionManager`, which reconnects transparently; a command
/// issued while the server is unreachable fails with a Redis error.
#[derive(Clone)]
pub struct RedisCursorStore {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisCursorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCursorStore")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisCursorStore {
    /// Connect to the Redis server at `redis_url`.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        tracing::info!("Connecting to Redis cursor store");

        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        tracing::info!("Connected to Redis cursor store");
        Ok(Self { conn })
    }

    /// Redis key holding the cursor for `key`.
    #[must_use]
    pub fn redis_key(key: &ScanKey) -> String {
        format!("{KEY_PREFIX}{key}")
    }
}

#[async_trait]
impl CursorStore for RedisCursorStore {
    async fn load(&self, key: &ScanKey) -> Result<Option<ScanCursor>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(Self::redis_key(key)).await?;
        tracing::debug!(scan_key = %key, found = value.is_some(), "Redis GET");
        Ok(value.map(ScanCursor::new))
    }

    async fn save(&self, key: &ScanKey, cursor: &ScanCursor) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(Self::redis_key(key), cursor.as_str()).await?;
        tracing::debug!(scan_key = %key, "Redis SET");
        Ok(())
    }

    async fn clear(&self, key: &ScanKey) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(Self::redis_key(key)).await?;
        tracing::debug!(scan_key = %key, "Redis DEL");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

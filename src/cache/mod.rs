pub mod count;
pub mod post;

use crate::api::ApiResult;
use crate::config;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Shared handle to the cache cluster. `ConnectionManager` multiplexes and
/// reconnects internally, so clones are cheap and safe to use concurrently.
#[derive(Clone)]
pub struct CacheClient {
    conn: ConnectionManager,
}

impl CacheClient {
    pub async fn connect() -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(config::get().cache.url.as_str())?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> ApiResult<Option<T>> {
        let mut conn = self.conn.clone();
        let cached: Option<String> = conn.get(key).await?;
        Ok(cached.and_then(|value| match serde_json::from_str(&value) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                // Treat undecodable entries as misses; the next write heals them
                warn!("Evicting malformed cache entry '{key}': {err}");
                None
            }
        }))
    }

    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T) -> ApiResult<()> {
        let serialized = serde_json::to_string(value)?;
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, serialized).await?;
        Ok(())
    }

    pub async fn evict(&self, key: &str) -> ApiResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> ApiResult<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(key).await?)
    }

    /// Create-if-absent write, so a seed never clobbers a counter another
    /// writer already seeded and incremented.
    pub async fn put_if_absent(&self, key: &str, value: i64) -> ApiResult<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.set_nx(key, value).await?)
    }

    /// Server-side atomic increment.
    pub async fn increment(&self, key: &str, delta: i64) -> ApiResult<i64> {
        let mut conn = self.conn.clone();
        Ok(conn.incr(key, delta).await?)
    }
}

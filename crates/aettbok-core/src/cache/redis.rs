//! Redis cache client.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::info;

use crate::error::{Error, Result};

use super::CacheClient;

fn cache_error(err: redis::RedisError) -> Error {
    Error::CacheUnavailable(err.to_string())
}

/// [`CacheClient`] over a multiplexed, auto-reconnecting Redis connection.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache").finish_non_exhaustive()
    }
}

impl RedisCache {
    /// Connects to the Redis server at `url`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheUnavailable` if the URL is invalid or the
    /// server cannot be reached.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(cache_error)?;
        let conn = ConnectionManager::new(client).await.map_err(cache_error)?;
        info!("Connected to Redis");
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheClient for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(cache_error)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        // SETEX rejects 0; clamp sub-second TTLs up.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(cache_error)
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(cache_error)
    }
}

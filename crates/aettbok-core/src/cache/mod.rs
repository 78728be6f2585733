//! Cache-aside layer.
//!
//! [`CacheClient`] is the key-value seam (GET / SETEX / DEL); [`NodeCache`]
//! puts the cache-aside policy on top: read through on miss, store with a
//! TTL, invalidate on write. Values are JSON text.
//!
//! Key scheme:
//! - collection: `"{label}"`
//! - node: `"{label}:{id}"`

mod memory;
#[cfg(feature = "redis")]
mod redis;


use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::ids::NodeId;
use crate::label::EntityLabel;

pub use memory::InMemoryCache;
#[cfg(feature = "redis")]
pub use self::redis::RedisCache;

/// Key-value cache client.
///
/// Every failure is reported as `Error::CacheUnavailable`.
#[async_trait]
pub trait CacheClient: Send + Sync {
    /// Returns the value stored under `key`, if any and not expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn del(&self, key: &str) -> Result<()>;
}

/// Cache key for every node of a label.
#[must_use]
pub fn collection_key(label: EntityLabel) -> String {
    label.as_str().to_string()
}

/// Cache key for one node.
#[must_use]
pub fn node_key(label: EntityLabel, id: &NodeId) -> String {
    format!("{label}:{id}")
}

/// Cache-aside policy over a [`CacheClient`].
#[derive(Clone)]
pub struct NodeCache {
    client: Arc<dyn CacheClient>,
    ttl: Duration,
    enabled: bool,
}

impl std::fmt::Debug for NodeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeCache")
            .field("ttl", &self.ttl)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl NodeCache {
    /// Creates an enabled cache storing entries for `ttl`.
    #[must_use]
    pub fn new(client: Arc<dyn CacheClient>, ttl: Duration) -> Self {
        Self {
            client,
            ttl,
            enabled: true,
        }
    }

    /// Creates a pass-through cache: every read loads, invalidation is a no-op.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            client: Arc::new(InMemoryCache::new()),
            ttl: Duration::ZERO,
            enabled: false,
        }
    }

    /// Returns `true` if reads are served from the cache.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the cached value under `key`, or runs `loader`, stores its
    /// result and returns it.
    ///
    /// An entry that no longer deserializes is treated as a miss.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheUnavailable` if the cache client fails, the
    /// loader's error if it fails, and `Error::Internal` if the loaded value
    /// cannot be serialized.
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, loader: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        if !self.enabled {
            return loader().await;
        }

        if let Some(text) = self.client.get(key).await? {
            match serde_json::from_str::<T>(&text) {
                Ok(value) => {
                    debug!(key, "Cache hit");
                    return Ok(value);
                }
                Err(err) => warn!(key, error = %err, "Discarding undecodable cache entry"),
            }
        }

        debug!(key, "Cache miss");
        let value = loader().await?;
        let text = serde_json::to_string(&value)
            .map_err(|e| Error::Internal(format!("cache serialization failed: {e}")))?;
        self.client.set(key, &text, self.ttl).await?;
        Ok(value)
    }

    /// Removes `key` from the cache.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheUnavailable` if the cache client fails.
    pub async fn invalidate(&self, key: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.client.del(key).await?;
        debug!(key, "Invalidated cache entry");
        Ok(())
    }

    /// Removes every key in `keys`, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns `Error::CacheUnavailable` if the cache client fails.
    pub async fn invalidate_all<I>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = String> + Send,
        I::IntoIter: Send,
    {
        for key in keys {
            self.invalidate(&key).await?;
        }
        Ok(())
    }
}

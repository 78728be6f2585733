//! In-process cache client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{Error, Result};

use super::CacheClient;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// [`CacheClient`] backed by a concurrent map with per-entry expiry.
///
/// Expired entries are dropped lazily on read.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<String, Entry>,
    offline: AtomicBool,
}

impl InMemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a cache outage (`true`) or recovery (`false`).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Returns `true` if a live entry exists under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|e| e.expires_at > Instant::now())
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(Error::CacheUnavailable("in-memory cache is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheClient for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_online()?;
        let now = Instant::now();
        // Guard must drop before `remove` on the same shard.
        let live = self
            .entries
            .get(key)
            .map(|e| (e.expires_at > now).then(|| e.value.clone()));
        match live {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                self.entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.ensure_online()?;
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.ensure_online()?;
        self.entries.remove(key);
        Ok(())
    }
}

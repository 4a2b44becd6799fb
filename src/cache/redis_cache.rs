//! Redis-backed page cache
//!
//! Entries are stored as JSON under `scrape:{base_url}:{page}` with a Redis
//! expiry equal to the entry's time-to-live. The embedded `expires_at` is
//! checked on read as well, so an entry written by a clock-skewed process is
//! still treated as stale once its deadline passes.

use crate::cache::traits::{CacheEntry, CacheKey, CacheResult, CacheStore};
use crate::product::PageResult;
use async_trait::async_trait;
use chrono::Duration;
use redis::aio::MultiplexedConnection;
use redis::Client;

/// Page cache backed by a Redis server
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    /// Connects to Redis and verifies the connection with `PING`
    ///
    /// # Arguments
    ///
    /// * `redis_url` - e.g. `redis://localhost:6379/0`
    ///
    /// # Returns
    ///
    /// * `Ok(RedisCache)` - Connected cache
    /// * `Err(CacheError)` - The URL was invalid or the server unreachable
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = Client::open(redis_url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await?;

        Ok(Self { conn })
    }

    async fn read(&self, key: &CacheKey) -> CacheResult<Option<CacheEntry>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(key.to_string())
            .query_async(&mut conn)
            .await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn write(&self, key: &CacheKey, entry: &CacheEntry, ttl: Duration) -> CacheResult<()> {
        let payload = serde_json::to_string(entry)?;
        let ttl_seconds = ttl.num_seconds().max(1);

        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key.to_string())
            .arg(payload)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async::<_, ()>(&mut conn)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &CacheKey) -> Option<PageResult> {
        match self.read(key).await {
            Ok(Some(entry)) if entry.is_expired() => {
                tracing::debug!("Cache entry {} is past its deadline", key);
                None
            }
            Ok(Some(entry)) => Some(entry.into_page_result(key.page_number())),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Cache unavailable for {}, treating as miss: {}", key, e);
                None
            }
        }
    }

    async fn put(&self, key: &CacheKey, page: &PageResult, ttl: Duration) {
        let entry = CacheEntry::new(page, ttl);
        if let Err(e) = self.write(key, &entry, ttl).await {
            tracing::warn!("Failed to write cache entry {}: {}", key, e);
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

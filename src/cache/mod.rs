//! Page cache module
//!
//! Listing pages are cached by `(base_url, page_number)` so repeated runs
//! within the time-to-live skip the network entirely. The cache is strictly
//! advisory: when it is disabled or unreachable every lookup is a miss and
//! the scrape proceeds over the network.

mod memory;
mod redis_cache;
mod traits;

pub use memory::{DisabledCache, MemoryCache};
pub use redis_cache::RedisCache;
pub use traits::{CacheEntry, CacheError, CacheKey, CacheResult, CacheStore};

use crate::config::CacheConfig;

/// Opens the cache described by the configuration
///
/// Returns a [`DisabledCache`] when no Redis URL is configured or when the
/// connection cannot be established; the failure is logged, never returned.
pub async fn open_cache(config: &CacheConfig) -> Box<dyn CacheStore> {
    let Some(redis_url) = config.redis_url.as_deref() else {
        tracing::info!("No redis-url configured, page cache disabled");
        return Box::new(DisabledCache);
    };

    match RedisCache::connect(redis_url).await {
        Ok(cache) => {
            tracing::info!("Redis cache initialized at {}", redis_url);
            Box::new(cache)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to connect to Redis at {}: {}. Continuing without cache",
                redis_url,
                e
            );
            Box::new(DisabledCache)
        }
    }
}

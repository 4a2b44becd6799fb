//! Process-local page caches

use crate::cache::traits::{CacheEntry, CacheError, CacheKey, CacheResult, CacheStore};
use crate::product::PageResult;
use async_trait::async_trait;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory cache that honours entry expiry
///
/// Useful for library callers that scrape the same shop several times in one
/// process, and as a stand-in for Redis in tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &CacheKey) -> CacheResult<Option<PageResult>> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;

        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.clone().into_page_result(key.page_number()))),
            None => Ok(None),
        }
    }

    fn store(&self, key: &CacheKey, entry: CacheEntry) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.clone(), entry);
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Option<PageResult> {
        self.lookup(key).unwrap_or_else(|e| {
            tracing::warn!("Cache read failed for {}: {}", key, e);
            None
        })
    }

    async fn put(&self, key: &CacheKey, page: &PageResult, ttl: Duration) {
        if let Err(e) = self.store(key, CacheEntry::new(page, ttl)) {
            tracing::warn!("Cache write failed for {}: {}", key, e);
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Cache that never stores anything
///
/// Selected when no Redis URL is configured or Redis cannot be reached, so
/// every lookup is a miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCache;

#[async_trait]
impl CacheStore for DisabledCache {
    async fn get(&self, _key: &CacheKey) -> Option<PageResult> {
        None
    }

    async fn put(&self, _key: &CacheKey, _page: &PageResult, _ttl: Duration) {}

    fn name(&self) -> &'static str {
        "disabled"
    }
}

//! Cache traits and shared types
//!
//! This module defines the interface every page cache implements, the cache
//! key policy and the serialized entry format.

use crate::product::{PageResult, ProductRecord};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised inside cache implementations
///
/// These never reach the scrape loop: [`CacheStore`] methods log them and
/// degrade to a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache lock poisoned")]
    Poisoned,
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Identity of one cached listing page
///
/// Keys are derived only from the base URL (trailing slashes removed) and the
/// page number, so they are stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    base_url: String,
    page_number: u32,
}

impl CacheKey {
    pub fn new(base_url: &str, page_number: u32) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            page_number,
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scrape:{}:{}", self.base_url, self.page_number)
    }
}

/// Serialized form of a cached page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub products: Vec<ProductRecord>,
    pub has_next: bool,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry that expires `ttl` from now
    pub fn new(page: &PageResult, ttl: Duration) -> Self {
        Self {
            products: page.products.clone(),
            has_next: page.has_next,
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn into_page_result(self, page_number: u32) -> PageResult {
        PageResult::new(page_number, self.products, self.has_next)
    }
}

/// Trait for page cache implementations
///
/// Both operations are best effort. `get` answers `None` on a miss, on an
/// expired entry and when the backend is unreachable; `put` logs failures
/// and returns normally.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Looks up a page that is still within its time-to-live
    async fn get(&self, key: &CacheKey) -> Option<PageResult>;

    /// Stores a page, replacing any previous entry for the key
    async fn put(&self, key: &CacheKey, page: &PageResult, ttl: Duration);

    /// Short name for log lines
    fn name(&self) -> &'static str;
}

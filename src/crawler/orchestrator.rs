//! Scrape orchestrator - the page loop
//!
//! One session walks the listing from page 1 upwards. Each page is looked up
//! in the cache first; on a miss it is fetched (after the crawl delay), parsed
//! and written through to the cache. The products are then persisted.
//!
//! The loop ends when `max_page` is passed, when a page reports no next page,
//! or when a fetch or parse failure occurs. A storage failure only fails the
//! page it happened on.

use crate::cache::{open_cache, CacheKey, CacheStore};
use crate::config::Config;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::parse_listing;
use crate::crawler::throttle::Throttle;
use crate::output::{FailureKind, ScrapeSummary, StopReason};
use crate::product::PageResult;
use crate::storage::{open_storage, ProductStorage};
use crate::ScraperError;
use std::time::{Duration, Instant};

/// Builds the listing URL for a page
///
/// Page 1 is the listing root, later pages use the `/page/{n}/` pattern.
///
/// ```
/// use shelf_scraper::crawler::page_url;
///
/// assert_eq!(page_url("https://shop.test/shop/", 1), "https://shop.test/shop/");
/// assert_eq!(page_url("https://shop.test/shop", 3), "https://shop.test/shop/page/3/");
/// ```
pub fn page_url(base_url: &str, page_number: u32) -> String {
    let base = base_url.trim_end_matches('/');
    if page_number <= 1 {
        format!("{}/", base)
    } else {
        format!("{}/page/{}/", base, page_number)
    }
}

/// Parameters of one scrape session
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub max_page: u32,
    pub crawl_delay: Duration,
    pub cache_ttl: chrono::Duration,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.scraper.base_url.clone(),
            auth_token: config.auth.token.clone(),
            max_page: config.scraper.max_page,
            crawl_delay: config.scraper.crawl_delay(),
            cache_ttl: config.cache.ttl(),
        }
    }
}

/// How a single page was obtained
enum PageSource {
    Cache,
    Network { attempts: u32 },
}

/// Drives one scrape session
pub struct ScrapeOrchestrator {
    settings: SessionSettings,
    fetcher: Fetcher,
    cache: Box<dyn CacheStore>,
    storage: Box<dyn ProductStorage>,
    throttle: Throttle,
}

impl ScrapeOrchestrator {
    pub fn new(
        settings: SessionSettings,
        fetcher: Fetcher,
        cache: Box<dyn CacheStore>,
        storage: Box<dyn ProductStorage>,
    ) -> Self {
        let throttle = Throttle::new(settings.crawl_delay);
        Self {
            settings,
            fetcher,
            cache,
            storage,
            throttle,
        }
    }

    /// Creates an orchestrator with the HTTP fetcher, cache and storage
    /// backend described by `config`
    ///
    /// # Returns
    ///
    /// * `Ok(ScrapeOrchestrator)` - Ready to run
    /// * `Err(ScraperError)` - The HTTP client or storage could not be set up
    pub async fn from_config(config: &Config) -> Result<Self, ScraperError> {
        let fetcher = Fetcher::from_config(config)?;
        let storage = open_storage(&config.storage)?;
        let cache = open_cache(&config.cache).await;

        Ok(Self::new(
            SessionSettings::from_config(config),
            fetcher,
            cache,
            storage,
        ))
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn storage(&self) -> &dyn ProductStorage {
        self.storage.as_ref()
    }

    /// Runs the page loop to completion
    ///
    /// Failures are recorded in the returned summary rather than returned as
    /// errors, so a session that aborts on its first page still produces a
    /// summary.
    pub async fn run(&mut self) -> ScrapeSummary {
        let started = Instant::now();
        let mut summary = ScrapeSummary::default();

        tracing::info!(
            "Starting scrape of {} (max page {}, cache: {}, storage: {})",
            self.settings.base_url,
            self.settings.max_page,
            self.cache.name(),
            self.storage.name()
        );
        if self.settings.auth_token.is_none() {
            tracing::warn!("No auth token configured, requests will be sent unauthenticated");
        }

        let mut current_page = 1;
        summary.stop_reason = loop {
            if current_page > self.settings.max_page {
                break StopReason::MaxPageReached;
            }

            let (page, source) = match self.obtain_page(current_page).await {
                Ok(obtained) => obtained,
                Err(kind) => {
                    tracing::error!("Page {} failed ({}), ending session", current_page, kind);
                    summary.record_failure(current_page, kind);
                    break StopReason::Aborted {
                        page_number: current_page,
                    };
                }
            };

            summary.pages_scraped += 1;
            summary.products_found += page.products.len();
            match source {
                PageSource::Cache => {
                    summary.pages_from_cache += 1;
                    tracing::info!(
                        "Page {}: cache hit, {} products",
                        current_page,
                        page.products.len()
                    );
                }
                PageSource::Network { attempts } => {
                    tracing::info!(
                        "Page {}: fetched in {} attempt(s), {} products",
                        current_page,
                        attempts,
                        page.products.len()
                    );
                }
            }

            match self.persist(&page) {
                Ok(written) => summary.products_persisted += written,
                Err(kind) => {
                    tracing::error!("Page {} not persisted ({}), continuing", current_page, kind);
                    summary.record_failure(current_page, kind);
                }
            }

            if !page.has_next {
                tracing::info!("Page {} has no next page, scrape complete", current_page);
                break StopReason::NoNextPage;
            }

            current_page += 1;
        };

        summary.elapsed = started.elapsed();
        tracing::info!(
            "Scrape finished ({}): {} pages, {} from cache, {} products persisted, {} failed",
            summary.stop_reason,
            summary.pages_scraped,
            summary.pages_from_cache,
            summary.products_persisted,
            summary.pages_failed()
        );

        summary
    }

    /// Returns the page from the cache, or fetches, parses and caches it
    async fn obtain_page(&mut self, page_number: u32) -> Result<(PageResult, PageSource), FailureKind> {
        let key = CacheKey::new(&self.settings.base_url, page_number);

        if let Some(cached) = self.cache.get(&key).await {
            return Ok((cached, PageSource::Cache));
        }
        tracing::debug!("Cache miss for {}", key);

        let url = page_url(&self.settings.base_url, page_number);

        self.throttle.wait().await;
        self.throttle.record_fetch();

        let fetched = self
            .fetcher
            .fetch(&url, self.settings.auth_token.as_deref())
            .await
            .map_err(|e| FailureKind::Fetch(e.kind))?;
        // Retries push the last request past the first stamp
        self.throttle.record_fetch_at(fetched.last_attempt_at);

        let page = parse_listing(&fetched.body, page_number)
            .map_err(|e| FailureKind::Parse(e.to_string()))?;

        self.cache.put(&key, &page, self.settings.cache_ttl).await;

        Ok((
            page,
            PageSource::Network {
                attempts: fetched.attempts,
            },
        ))
    }

    fn persist(&mut self, page: &PageResult) -> Result<usize, FailureKind> {
        if page.is_empty() {
            return Ok(0);
        }

        let written = self
            .storage
            .save(&page.products)
            .map_err(|e| FailureKind::Storage(e.to_string()))?;
        tracing::info!(
            "Page {}: persisted {} products to {}",
            page.page_number,
            written,
            self.storage.name()
        );
        Ok(written)
    }
}

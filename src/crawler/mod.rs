//! Crawler module for listing page fetching and processing
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with bearer auth and retry logic
//! - Product listing parsing
//! - Crawl-delay throttling
//! - The page loop tying cache, fetcher, parser and storage together

mod fetcher;
mod orchestrator;
mod parser;
mod retry;
mod throttle;

pub use fetcher::{
    build_http_client, classify_status, AttemptError, FetchError, FetchErrorKind, FetchedPage,
    Fetcher, HttpTransport, Transport,
};
pub use orchestrator::{page_url, ScrapeOrchestrator, SessionSettings};
pub use parser::{parse_listing, ParseError};
pub use retry::{RetryDecision, RetryPolicy, RetryState};
pub use throttle::Throttle;

use crate::config::Config;
use crate::output::ScrapeSummary;
use crate::ScraperError;

/// Runs a complete scrape session
///
/// This is the main entry point for scraping. It will:
/// 1. Build the HTTP client and retry policy
/// 2. Open the storage backend and the page cache
/// 3. Walk the listing pages
/// 4. Return the session summary
///
/// # Returns
///
/// * `Ok(ScrapeSummary)` - Session ran; page failures are in the summary
/// * `Err(ScraperError)` - The session could not be set up
pub async fn scrape(config: &Config) -> Result<ScrapeSummary, ScraperError> {
    let mut orchestrator = ScrapeOrchestrator::from_config(config).await?;
    Ok(orchestrator.run().await)
}

//! Run summary produced at the end of every scrape session

use crate::crawler::FetchErrorKind;
use std::fmt;
use std::time::Duration;

/// Why a page failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Fetch(FetchErrorKind),
    Parse(String),
    Storage(String),
}

impl FailureKind {
    /// Short label used in log lines and the summary table
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fetch(FetchErrorKind::Transient { .. }) => "fetch-transient",
            Self::Fetch(FetchErrorKind::NonRetryable { .. }) => "fetch-non-retryable",
            Self::Parse(_) => "parse",
            Self::Storage(_) => "storage",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(kind) => write!(f, "{}: {}", self.label(), kind),
            Self::Parse(message) | Self::Storage(message) => {
                write!(f, "{}: {}", self.label(), message)
            }
        }
    }
}

/// A page that could not be fully processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub page_number: u32,
    pub kind: FailureKind,
}

/// How the page loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// `max_page` pages were visited
    #[default]
    MaxPageReached,

    /// A page reported no following page
    NoNextPage,

    /// A fetch or parse failure ended the session at this page
    Aborted { page_number: u32 },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxPageReached => f.write_str("reached max page"),
            Self::NoNextPage => f.write_str("no next page"),
            Self::Aborted { page_number } => write!(f, "aborted at page {}", page_number),
        }
    }
}

/// Counters for one scrape session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeSummary {
    /// Pages fetched and parsed, or served from cache
    pub pages_scraped: u32,

    /// Subset of `pages_scraped` that came from the cache
    pub pages_from_cache: u32,

    /// Products seen across all scraped pages
    pub products_found: usize,

    /// Products the storage backend accepted
    pub products_persisted: usize,

    /// Failed pages in the order they failed
    pub failures: Vec<PageFailure>,

    pub stop_reason: StopReason,

    pub elapsed: Duration,
}

impl ScrapeSummary {
    pub fn pages_failed(&self) -> usize {
        self.failures.len()
    }

    pub fn record_failure(&mut self, page_number: u32, kind: FailureKind) {
        self.failures.push(PageFailure { page_number, kind });
    }
}

/// Prints the summary to stdout in a formatted manner
pub fn print_summary(summary: &ScrapeSummary) {
    println!();
    println!("=== Scraping Session Summary ===");
    println!("Pages scraped:        {}", summary.pages_scraped);
    println!("  served from cache:  {}", summary.pages_from_cache);
    println!("Products found:       {}", summary.products_found);
    println!("Products persisted:   {}", summary.products_persisted);
    println!("Pages failed:         {}", summary.pages_failed());
    for failure in &summary.failures {
        println!("  - page {}: {}", failure.page_number, failure.kind);
    }
    println!("Stopped:              {}", summary.stop_reason);
    println!("Elapsed:              {:.2?}", summary.elapsed);
    println!("================================");
    println!();
}

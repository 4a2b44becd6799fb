//! Output module for run summaries and stored product listings
//!
//! This module handles everything printed to stdout:
//! - the end-of-run summary of a scrape session
//! - the `--list` dump of persisted products

mod listing;
mod summary;

pub use listing::{format_product, load_products, print_products};
pub use summary::{print_summary, FailureKind, PageFailure, ScrapeSummary, StopReason};

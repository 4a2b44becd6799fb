//! Configuration module for Shelf-Scraper
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and merging them with command-line overrides.
//!
//! # Example
//!
//! ```no_run
//! use shelf_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scraper.toml")).unwrap();
//! println!("Scraper will visit up to {} pages", config.scraper.max_page);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AuthConfig, CacheConfig, Config, ConfigOverrides, FetchConfig, ScraperConfig, StorageConfig,
    StorageKind, MAX_CRAWL_DELAY_SECONDS, MAX_TTL_HOURS,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, merge_config, resolve_config,
};

//! Shelf-Scraper main entry point
//!
//! This is the command-line interface for the Shelf-Scraper product scraper.

use anyhow::Context;
use clap::Parser;
use shelf_scraper::config::{merge_config, resolve_config, Config, ConfigOverrides, StorageKind};
use shelf_scraper::crawler::{page_url, scrape};
use shelf_scraper::output::{load_products, print_products, print_summary};
use shelf_scraper::storage::open_storage;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shelf-Scraper: a polite product listing scraper
///
/// Walks the paginated product listing of a shop, caches each page, and
/// stores the products it finds in SQLite or a JSON file.
#[derive(Parser, Debug)]
#[command(name = "shelf-scraper")]
#[command(version)]
#[command(about = "A polite product listing scraper", long_about = None)]
struct Cli {
    /// Listing root URL, e.g. https://shop.example/shop
    #[arg(value_name = "BASE_URL")]
    base_url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Highest page number to visit
    #[arg(long, value_name = "N")]
    max_page: Option<u32>,

    /// Bearer token for the shop
    #[arg(long, env = "SHELF_SCRAPER_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Redis URL for the page cache; caching is disabled without one
    #[arg(long, value_name = "URL")]
    redis_url: Option<String>,

    /// Storage backend
    #[arg(long, value_enum)]
    storage: Option<StorageKind>,

    /// Seconds to wait between network fetches
    #[arg(long, value_name = "SECS")]
    crawl_delay: Option<f64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scraped without scraping
    #[arg(long, conflicts_with = "list")]
    dry_run: bool,

    /// Print the stored products and exit
    #[arg(long, conflicts_with = "dry_run")]
    list: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            max_page: self.max_page,
            crawl_delay_seconds: self.crawl_delay,
            auth_token: self.auth_token.clone(),
            redis_url: self.redis_url.clone(),
            storage_backend: self.storage,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if cli.list {
        let config = merge_config(cli.config.as_deref(), cli.overrides())
            .context("Failed to load configuration")?;
        return handle_list(&config);
    }

    if let Some(path) = &cli.config {
        tracing::info!("Loading configuration from: {}", path.display());
    }
    let config = match resolve_config(cli.config.as_deref(), cli.overrides()) {
        Ok((config, hash)) => {
            if let Some(hash) = hash {
                tracing::info!("Configuration loaded successfully (hash: {})", hash);
            }
            config
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(())
    } else {
        handle_scrape(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelf_scraper=info,warn"),
            1 => EnvFilter::new("shelf_scraper=debug,info"),
            2 => EnvFilter::new("shelf_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be scraped
fn handle_dry_run(config: &Config) {
    println!("=== Shelf-Scraper Dry Run ===\n");

    println!("Scraper Configuration:");
    println!("  Base URL: {}", config.scraper.base_url);
    println!("  Max page: {}", config.scraper.max_page);
    println!("  Crawl delay: {:?}", config.scraper.crawl_delay());
    println!("  User agent: {}", config.scraper.user_agent);
    println!(
        "  Auth token: {}",
        if config.auth.token.is_some() { "set" } else { "not set" }
    );

    println!("\nRetry:");
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!(
        "  Backoff: {}ms doubling, capped at {}ms",
        config.fetch.base_delay_ms, config.fetch.max_delay_ms
    );

    println!("\nCache:");
    match &config.cache.redis_url {
        Some(url) => println!("  Redis: {} (ttl {}h)", url, config.cache.ttl_hours),
        None => println!("  Disabled"),
    }

    println!("\nStorage:");
    match config.storage.backend {
        StorageKind::Sqlite => println!("  SQLite: {}", config.storage.database_path),
        StorageKind::Json => println!("  JSON: {}", config.storage.json_path),
    }

    println!("\nPages:");
    for page in 1..=config.scraper.max_page {
        println!("  {}", page_url(&config.scraper.base_url, page));
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --list mode: prints every stored product
fn handle_list(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(&config.storage).context("Failed to open storage")?;

    println!(
        "Storage: {} ({})\n",
        storage.name(),
        match config.storage.backend {
            StorageKind::Sqlite => &config.storage.database_path,
            StorageKind::Json => &config.storage.json_path,
        }
    );

    let products = load_products(storage.as_ref()).context("Failed to read stored products")?;
    print_products(&products);

    Ok(())
}

/// Handles the main scrape operation
///
/// Page failures are reported in the summary; only setup failures make the
/// process exit with an error.
async fn handle_scrape(config: &Config) -> anyhow::Result<()> {
    tracing::info!(
        "Storage backend: {}, cache: {}",
        config.storage.backend.as_str(),
        if config.cache.redis_url.is_some() { "redis" } else { "disabled" }
    );

    match scrape(config).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}

use serde::Deserialize;
use std::time::Duration;

/// Longest accepted crawl delay, one hour
pub const MAX_CRAWL_DELAY_SECONDS: f64 = 3_600.0;

/// Longest accepted cache time-to-live, one year
pub const MAX_TTL_HOURS: u64 = 24 * 365;

/// Main configuration structure for Shelf-Scraper
///
/// Every section is optional in the TOML file; missing values fall back to the
/// defaults below. Only `scraper.base-url` has no usable default and must be
/// provided either in the file or on the command line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Applies command-line overrides on top of the file/default values
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.base_url {
            self.scraper.base_url = base_url;
        }
        if let Some(max_page) = overrides.max_page {
            self.scraper.max_page = max_page;
        }
        if let Some(delay) = overrides.crawl_delay_seconds {
            self.scraper.crawl_delay_seconds = delay;
        }
        if let Some(token) = overrides.auth_token {
            self.auth.token = Some(token);
        }
        if let Some(redis_url) = overrides.redis_url {
            self.cache.redis_url = Some(redis_url);
        }
        if let Some(backend) = overrides.storage_backend {
            self.storage.backend = backend;
        }
    }
}

/// Pagination and politeness settings
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Listing root, e.g. `https://shop.example/shop`
    #[serde(rename = "base-url", default)]
    pub base_url: String,

    /// Highest page number to visit
    #[serde(rename = "max-page", default = "default_max_page")]
    pub max_page: u32,

    /// Minimum time between two network fetches
    #[serde(rename = "crawl-delay-seconds", default = "default_crawl_delay")]
    pub crawl_delay_seconds: f64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl ScraperConfig {
    pub fn crawl_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.crawl_delay_seconds.clamp(0.0, MAX_CRAWL_DELAY_SECONDS))
            .unwrap_or_default()
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            max_page: default_max_page(),
            crawl_delay_seconds: default_crawl_delay(),
            user_agent: default_user_agent(),
        }
    }
}

/// HTTP fetch and retry settings
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Total attempts per page, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the second attempt (milliseconds); doubles per attempt
    #[serde(rename = "base-delay-ms", default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound for a single backoff sleep (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Optional proxy for all requests
    #[serde(default)]
    pub proxy: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            proxy: None,
        }
    }
}

/// Authentication settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Bearer token sent in the `Authorization` header
    #[serde(default)]
    pub token: Option<String>,
}

/// Page cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Redis connection URL; caching is disabled when absent
    #[serde(rename = "redis-url", default)]
    pub redis_url: Option<String>,

    #[serde(rename = "ttl-hours", default = "default_ttl_hours")]
    pub ttl_hours: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        let hours = i64::try_from(self.ttl_hours.min(MAX_TTL_HOURS)).unwrap_or(0);
        chrono::Duration::hours(hours)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            ttl_hours: default_ttl_hours(),
        }
    }
}

/// Which persistence backend receives scraped products
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// One JSON document holding every record
    #[serde(alias = "file")]
    #[value(alias = "file")]
    Json,

    /// SQLite database with a uniqueness constraint on the natural key
    #[default]
    #[serde(alias = "relational")]
    #[value(alias = "relational")]
    Sqlite,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageKind,

    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Path to the JSON document
    #[serde(rename = "json-path", default = "default_json_path")]
    pub json_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageKind::default(),
            database_path: default_database_path(),
            json_path: default_json_path(),
        }
    }
}

/// Values supplied on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub max_page: Option<u32>,
    pub crawl_delay_seconds: Option<f64>,
    pub auth_token: Option<String>,
    pub redis_url: Option<String>,
    pub storage_backend: Option<StorageKind>,
}

fn default_max_page() -> u32 {
    5
}

fn default_crawl_delay() -> f64 {
    1.0
}

fn default_user_agent() -> String {
    format!("ShelfScraper/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_ttl_hours() -> u64 {
    24
}

fn default_database_path() -> String {
    "products.db".to_string()
}

fn default_json_path() -> String {
    "products.json".to_string()
}

use crate::config::types::{
    CacheConfig, Config, FetchConfig, ScraperConfig, StorageConfig, MAX_CRAWL_DELAY_SECONDS,
    MAX_TTL_HOURS,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_fetch_config(&config.fetch)?;
    validate_cache_config(&config.cache)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates pagination and politeness settings
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.base_url.trim().is_empty() {
        return Err(ConfigError::Missing("base-url"));
    }

    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", config.base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.max_page < 1 {
        return Err(ConfigError::Validation(format!(
            "max-page must be >= 1, got {}",
            config.max_page
        )));
    }

    if !(0.0..=MAX_CRAWL_DELAY_SECONDS).contains(&config.crawl_delay_seconds) {
        return Err(ConfigError::Validation(format!(
            "crawl-delay-seconds must be between 0 and {}, got {}",
            MAX_CRAWL_DELAY_SECONDS, config.crawl_delay_seconds
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates retry and transport settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.max_delay_ms < config.base_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max-delay-ms ({}) must be >= base-delay-ms ({})",
            config.max_delay_ms, config.base_delay_ms
        )));
    }

    if config.timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs and connect-timeout-secs must be >= 1".to_string(),
        ));
    }

    if let Some(proxy) = &config.proxy {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    Ok(())
}

/// Validates cache settings
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if let Some(redis_url) = &config.redis_url {
        let url = Url::parse(redis_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid redis-url '{}': {}", redis_url, e))
        })?;

        if !matches!(url.scheme(), "redis" | "rediss" | "redis+unix" | "unix") {
            return Err(ConfigError::Validation(format!(
                "redis-url '{}' must use a redis:// or rediss:// scheme",
                redis_url
            )));
        }
    }

    if config.ttl_hours < 1 || config.ttl_hours > MAX_TTL_HOURS {
        return Err(ConfigError::Validation(format!(
            "ttl-hours must be between 1 and {}, got {}",
            MAX_TTL_HOURS, config.ttl_hours
        )));
    }

    Ok(())
}

/// Validates storage paths
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.json_path.is_empty() {
        return Err(ConfigError::Validation(
            "json-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

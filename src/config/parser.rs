use crate::config::types::{Config, ConfigOverrides};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use shelf_scraper::config::load_config;
///
/// let config = load_config(Path::new("scraper.toml")).unwrap();
/// println!("Max page: {}", config.scraper.max_page);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = read_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so two runs can be matched to the exact configuration
/// they used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Builds the effective configuration for a run
///
/// Starts from the TOML file when one is given (defaults otherwise), layers
/// the command-line overrides on top, then validates the result. The file is
/// validated only after overrides are applied, so a file may omit the base
/// URL when it is passed on the command line.
///
/// # Returns
///
/// The resolved configuration and the hash of the file, if a file was read.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<(Config, Option<String>), ConfigError> {
    let (mut config, hash) = match path {
        Some(path) => (read_config(path)?, Some(compute_config_hash(path)?)),
        None => (Config::default(), None),
    };

    config.apply_overrides(overrides);
    validate(&config)?;

    Ok((config, hash))
}

/// Reads the configuration and applies overrides without validating
///
/// Used by modes that only read local state, such as listing stored
/// products, where a base URL is not needed.
pub fn merge_config(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => Config::default(),
    };
    config.apply_overrides(overrides);
    Ok(config)
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[scraper]
base-url = "https://shop.test/shop"
max-page = 3
crawl-delay-seconds = 0.5

[fetch]
max-attempts = 4
base-delay-ms = 200

[auth]
token = "secret-token"

[cache]
redis-url = "redis://localhost:6379/0"

[storage]
backend = "json"
json-path = "./out.json"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.scraper.base_url, "https://shop.test/shop");
        assert_eq!(config.scraper.max_page, 3);
        assert_eq!(config.fetch.max_attempts, 4);
        assert_eq!(config.fetch.max_delay_ms, 30_000);
        assert_eq!(config.auth.token.as_deref(), Some("secret-token"));
        assert_eq!(config.storage.backend, StorageKind::Json);
        assert_eq!(config.storage.json_path, "./out.json");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/scraper.toml"));
        assert!(matches!(result.unwrap_err(), ConfigError::Io(_)));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[scraper]
base-url = "https://shop.test/"
max-page = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_resolve_without_file_requires_base_url() {
        let result = resolve_config(None, ConfigOverrides::default());
        assert!(matches!(result.unwrap_err(), ConfigError::Missing(_)));
    }

    #[test]
    fn test_resolve_cli_overrides_file() {
        let file = create_temp_config(
            r#"
[scraper]
max-page = 2

[storage]
backend = "json"
"#,
        );

        let overrides = ConfigOverrides {
            base_url: Some("https://shop.test/".to_string()),
            max_page: Some(7),
            ..Default::default()
        };

        let (config, hash) = resolve_config(Some(file.path()), overrides).unwrap();
        assert_eq!(config.scraper.base_url, "https://shop.test/");
        assert_eq!(config.scraper.max_page, 7);
        assert_eq!(config.storage.backend, StorageKind::Json);
        assert_eq!(hash.map(|h| h.len()), Some(64));
    }

    #[test]
    fn test_merge_config_skips_validation() {
        let overrides = ConfigOverrides {
            storage_backend: Some(StorageKind::Json),
            ..Default::default()
        };

        let config = merge_config(None, overrides).unwrap();
        assert!(config.scraper.base_url.is_empty());
        assert_eq!(config.storage.backend, StorageKind::Json);
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}

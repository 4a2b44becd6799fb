//! Storage module for persisting scraped products
//!
//! This module provides the two persistence backends:
//! - SQLite, one `products` table with a uniqueness constraint on the
//!   natural key
//! - a single JSON document merged by natural key on every save

mod json_file;
mod schema;
mod sqlite;
mod traits;

pub use json_file::JsonFileStorage;
pub use sqlite::SqliteStorage;
pub use traits::{ProductStorage, StorageError, StorageResult};

use crate::config::{StorageConfig, StorageKind};
use std::path::Path;

/// Opens the storage backend selected in the configuration
///
/// # Returns
///
/// * `Ok(Box<dyn ProductStorage>)` - Ready backend
/// * `Err(StorageError)` - The database could not be opened
pub fn open_storage(config: &StorageConfig) -> StorageResult<Box<dyn ProductStorage>> {
    match config.backend {
        StorageKind::Sqlite => {
            let storage = SqliteStorage::new(Path::new(&config.database_path))?;
            tracing::info!("Database initialized at {}", config.database_path);
            Ok(Box::new(storage))
        }
        StorageKind::Json => {
            tracing::info!("Products will be written to {}", config.json_path);
            Ok(Box::new(JsonFileStorage::new(&config.json_path)))
        }
    }
}

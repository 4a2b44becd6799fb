//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::product::ProductRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt stored record: {0}")]
    Corrupt(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for product persistence backends
///
/// Every backend identifies records by their natural key (page number, name
/// and image URL). Saving a record whose key is already stored replaces the
/// stored copy, so saving the same page twice leaves the record count
/// unchanged.
pub trait ProductStorage: Send {
    /// Persists a batch of records
    ///
    /// # Returns
    ///
    /// The number of records written (inserted or updated)
    fn save(&mut self, records: &[ProductRecord]) -> StorageResult<usize>;

    /// Counts stored records
    fn count(&self) -> StorageResult<u64>;

    /// Loads every stored record, ordered by page number then insertion
    fn list(&self) -> StorageResult<Vec<ProductRecord>>;

    /// Short name for log lines
    fn name(&self) -> &'static str;
}

//! JSON file storage implementation
//!
//! All records live in a single pretty-printed JSON array. A save reads the
//! current document, merges the batch by natural key and rewrites the file
//! through a temporary sibling that is renamed into place, so readers never
//! observe a half-written document.

use crate::product::ProductRecord;
use crate::storage::traits::{ProductStorage, StorageResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File-based storage backend
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Creates a storage handle for the given document path
    ///
    /// The file is created on first save; missing parent directories are
    /// created as well.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StorageResult<Vec<ProductRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_str(&content)?)
    }

    fn write_atomically(&self, records: &[ProductRecord]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, serde_json::to_vec_pretty(records)?)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl ProductStorage for JsonFileStorage {
    fn save(&mut self, records: &[ProductRecord]) -> StorageResult<usize> {
        let mut stored = self.load()?;

        let mut positions: HashMap<(u32, String, String), usize> = stored
            .iter()
            .enumerate()
            .map(|(i, r)| (owned_key(r), i))
            .collect();

        for record in records {
            match positions.get(&owned_key(record)) {
                Some(&i) => stored[i] = record.clone(),
                None => {
                    positions.insert(owned_key(record), stored.len());
                    stored.push(record.clone());
                }
            }
        }

        self.write_atomically(&stored)?;
        tracing::debug!("Products saved to {}", self.path.display());
        Ok(records.len())
    }

    fn count(&self) -> StorageResult<u64> {
        Ok(self.load()?.len() as u64)
    }

    fn list(&self) -> StorageResult<Vec<ProductRecord>> {
        let mut records = self.load()?;
        // Stable sort keeps insertion order within a page
        records.sort_by_key(|r| r.page_number());
        Ok(records)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

fn owned_key(record: &ProductRecord) -> (u32, String, String) {
    let key = record.natural_key();
    (key.page_number, key.name.to_string(), key.image_url.to_string())
}

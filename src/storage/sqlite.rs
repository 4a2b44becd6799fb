//! SQLite storage implementation
//!
//! This module provides the relational implementation of the ProductStorage
//! trait. Each `save` runs inside one transaction and upserts on the natural
//! key, so a page can be persisted any number of times without duplicates.

use crate::product::{Price, ProductRecord};
use crate::storage::schema::{initialize_schema, UPSERT_PRODUCT_SQL};
use crate::storage::traits::{ProductStorage, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl ProductStorage for SqliteStorage {
    fn save(&mut self, records: &[ProductRecord]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut written = 0;

        {
            let mut stmt = tx.prepare_cached(UPSERT_PRODUCT_SQL)?;
            for record in records {
                let regular = record.regular_price();
                stmt.execute(params![
                    record.page_number(),
                    record.name(),
                    record.image_url().unwrap_or(""),
                    record.price().to_string(),
                    record.price().minor_units(),
                    regular.map(|p| p.to_string()),
                    regular.and_then(|p| p.minor_units()),
                    record.on_sale(),
                    record.product_url(),
                    record.scraped_at().to_rfc3339(),
                ])?;
                written += 1;
            }
        }

        tx.commit()?;
        Ok(written)
    }

    fn count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn list(&self) -> StorageResult<Vec<ProductRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT page_number, name, image_url, price, price_minor, regular_price,
             regular_price_minor, on_sale, product_url, scraped_at
             FROM products ORDER BY page_number, id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ProductRow {
                page_number: row.get(0)?,
                name: row.get(1)?,
                image_url: row.get(2)?,
                price: row.get(3)?,
                price_minor: row.get(4)?,
                regular_price: row.get(5)?,
                regular_price_minor: row.get(6)?,
                on_sale: row.get(7)?,
                product_url: row.get(8)?,
                scraped_at: row.get(9)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

/// Raw column values of one `products` row
struct ProductRow {
    page_number: u32,
    name: String,
    image_url: String,
    price: String,
    price_minor: Option<i64>,
    regular_price: Option<String>,
    regular_price_minor: Option<i64>,
    on_sale: bool,
    product_url: Option<String>,
    scraped_at: String,
}

impl ProductRow {
    fn into_record(self) -> StorageResult<ProductRecord> {
        let scraped_at = DateTime::parse_from_rfc3339(&self.scraped_at)
            .map_err(|e| StorageError::Corrupt(format!("bad scraped_at '{}': {}", self.scraped_at, e)))?
            .with_timezone(&Utc);

        let record = ProductRecord::new(
            self.name,
            price_from_columns(self.price, self.price_minor),
            self.page_number,
        )
        .map_err(|e| StorageError::Corrupt(e.to_string()))?
        .with_image_url(Some(self.image_url))
        .with_product_url(self.product_url)
        .with_scraped_at(scraped_at);

        Ok(match self.regular_price {
            Some(regular) => {
                record.with_sale(price_from_columns(regular, self.regular_price_minor), self.on_sale)
            }
            None => record,
        })
    }
}

fn price_from_columns(text: String, minor_units: Option<i64>) -> Price {
    match minor_units {
        Some(minor_units) => Price::Amount { minor_units },
        None => Price::Unparseable { raw: text },
    }
}

//! Database schema definitions
//!
//! This module contains the SQL schema for the Shelf-Scraper product database.

/// SQL schema for the database
///
/// `image_url` is stored as an empty string rather than NULL when a product
/// has no image, because SQLite treats NULLs as distinct inside a UNIQUE
/// constraint.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_number INTEGER NOT NULL,
    name TEXT NOT NULL,
    image_url TEXT NOT NULL DEFAULT '',
    price TEXT NOT NULL,
    price_minor INTEGER,
    regular_price TEXT,
    regular_price_minor INTEGER,
    on_sale INTEGER NOT NULL DEFAULT 0,
    product_url TEXT,
    scraped_at TEXT NOT NULL,
    UNIQUE(page_number, name, image_url)
);

CREATE INDEX IF NOT EXISTS idx_products_page ON products(page_number);
"#;

/// Upsert keyed on the natural key
pub const UPSERT_PRODUCT_SQL: &str = r#"
INSERT INTO products (
    page_number, name, image_url, price, price_minor,
    regular_price, regular_price_minor, on_sale, product_url, scraped_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
ON CONFLICT(page_number, name, image_url) DO UPDATE SET
    price = excluded.price,
    price_minor = excluded.price_minor,
    regular_price = excluded.regular_price,
    regular_price_minor = excluded.regular_price_minor,
    on_sale = excluded.on_sale,
    product_url = excluded.product_url,
    scraped_at = excluded.scraped_at
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

//! Listing of persisted products
//!
//! Backs the `--list` mode: reads everything a storage backend holds and
//! prints it grouped by page.

use crate::product::ProductRecord;
use crate::storage::{ProductStorage, StorageResult};

/// Loads every stored product
pub fn load_products(storage: &dyn ProductStorage) -> StorageResult<Vec<ProductRecord>> {
    storage.list()
}

/// Formats one product as an indented block
pub fn format_product(product: &ProductRecord) -> String {
    let mut lines = vec![format!("  {}", product.name())];

    match product.regular_price() {
        Some(regular) if product.on_sale() => {
            lines.push(format!("    Price: {} (was {})", product.price(), regular));
        }
        _ => lines.push(format!("    Price: {}", product.price())),
    }

    if let Some(url) = product.product_url() {
        lines.push(format!("    URL: {}", url));
    }
    if let Some(image) = product.image_url() {
        lines.push(format!("    Image: {}", image));
    }
    lines.push(format!("    Scraped: {}", product.scraped_at().to_rfc3339()));

    lines.join("\n")
}

/// Prints products to stdout grouped by page number
pub fn print_products(products: &[ProductRecord]) {
    println!("=== Products ({}) ===", products.len());

    let mut current_page = None;
    for product in products {
        if current_page != Some(product.page_number()) {
            current_page = Some(product.page_number());
            println!("\nPage {}:", product.page_number());
        }
        println!("{}", format_product(product));
    }
}

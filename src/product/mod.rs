//! Product data model
//!
//! Value types shared by the parser, the cache and the storage backends.

mod price;
mod record;

pub use price::Price;
pub use record::{InvalidProduct, NaturalKey, ProductRecord};

use serde::{Deserialize, Serialize};

/// Products parsed from one listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub page_number: u32,

    /// Products in the order they appear on the page
    pub products: Vec<ProductRecord>,

    /// Whether the page links to a following page
    pub has_next: bool,
}

impl PageResult {
    pub fn new(page_number: u32, products: Vec<ProductRecord>, has_next: bool) -> Self {
        Self {
            page_number,
            products,
            has_next,
        }
    }

    /// A page with no products; always terminal
    pub fn empty(page_number: u32) -> Self {
        Self::new(page_number, Vec::new(), false)
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

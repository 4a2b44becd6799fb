use crate::product::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected product data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidProduct {
    #[error("product name cannot be empty")]
    EmptyName,

    #[error("page number must be >= 1")]
    InvalidPage,
}

/// One scraped product
///
/// Records are immutable once built. The name is guaranteed non-empty and the
/// page number positive; both are checked by [`ProductRecord::new`] and again
/// when a record is deserialized from a cache entry or a storage file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordFields")]
pub struct ProductRecord {
    name: String,
    price: Price,
    regular_price: Option<Price>,
    on_sale: bool,
    image_url: Option<String>,
    product_url: Option<String>,
    page_number: u32,
    scraped_at: DateTime<Utc>,
}

/// Unchecked mirror of [`ProductRecord`] used for deserialization
#[derive(Deserialize)]
struct RecordFields {
    name: String,
    price: Price,
    #[serde(default)]
    regular_price: Option<Price>,
    #[serde(default)]
    on_sale: bool,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    product_url: Option<String>,
    page_number: u32,
    scraped_at: DateTime<Utc>,
}

impl TryFrom<RecordFields> for ProductRecord {
    type Error = InvalidProduct;

    fn try_from(fields: RecordFields) -> Result<Self, Self::Error> {
        let record = Self::new(fields.name, fields.price, fields.page_number)?
            .with_image_url(fields.image_url)
            .with_product_url(fields.product_url)
            .with_scraped_at(fields.scraped_at);

        Ok(match fields.regular_price {
            Some(regular) => record.with_sale(regular, fields.on_sale),
            None => record,
        })
    }
}

impl ProductRecord {
    /// Creates a record stamped with the current time
    ///
    /// The name is trimmed; an empty name is rejected.
    pub fn new(
        name: impl Into<String>,
        price: Price,
        page_number: u32,
    ) -> Result<Self, InvalidProduct> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(InvalidProduct::EmptyName);
        }
        if page_number == 0 {
            return Err(InvalidProduct::InvalidPage);
        }

        Ok(Self {
            name,
            price,
            regular_price: None,
            on_sale: false,
            image_url: None,
            product_url: None,
            page_number,
            scraped_at: Utc::now(),
        })
    }

    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = non_blank(image_url);
        self
    }

    pub fn with_product_url(mut self, product_url: Option<String>) -> Self {
        self.product_url = non_blank(product_url);
        self
    }

    /// Records the pre-discount price and whether the listing shows a sale
    pub fn with_sale(mut self, regular_price: Price, on_sale: bool) -> Self {
        self.regular_price = Some(regular_price);
        self.on_sale = on_sale;
        self
    }

    pub fn with_scraped_at(mut self, scraped_at: DateTime<Utc>) -> Self {
        self.scraped_at = scraped_at;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> &Price {
        &self.price
    }

    pub fn regular_price(&self) -> Option<&Price> {
        self.regular_price.as_ref()
    }

    pub fn on_sale(&self) -> bool {
        self.on_sale
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn product_url(&self) -> Option<&str> {
        self.product_url.as_deref()
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn scraped_at(&self) -> DateTime<Utc> {
        self.scraped_at
    }

    /// Identity used to detect duplicates: page, name and image
    ///
    /// A missing image participates as the empty string.
    pub fn natural_key(&self) -> NaturalKey<'_> {
        NaturalKey {
            page_number: self.page_number,
            name: &self.name,
            image_url: self.image_url.as_deref().unwrap_or(""),
        }
    }
}

/// Borrowed natural key of a [`ProductRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NaturalKey<'a> {
    pub page_number: u32,
    pub name: &'a str,
    pub image_url: &'a str,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

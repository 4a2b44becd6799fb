//! HTML parser for product listing pages
//!
//! This module turns a listing page into a [`PageResult`]:
//! - product blocks (`li.type-product`, falling back to `li.product`)
//! - name, price (sale and regular), image and product link per block
//! - whether the page links to a following page

use crate::product::{PageResult, Price, ProductRecord};
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// A payload that is not a listing page at all
///
/// A well-formed page without products is not an error; it parses to an
/// empty, terminal [`PageResult`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("page {page_number} returned an empty payload")]
    EmptyPayload { page_number: u32 },

    #[error("page {page_number} is not HTML markup (starts with {preview:?})")]
    NotMarkup { page_number: u32, preview: String },
}

const PRODUCT_BLOCKS: &[&str] = &["li.type-product", "li.product"];
const TITLE_LINKS: &[&str] = &[
    ".woo-loop-product__title a",
    "a.woocommerce-LoopProduct-link",
    "a[href]",
];
const TITLE_TEXT: &[&str] = &[
    ".woo-loop-product__title",
    ".woocommerce-loop-product__title",
    "h2",
    "h3",
];
const NEXT_PAGE: &str = "a.next, a[rel~=\"next\"], link[rel~=\"next\"]";

/// Parses a listing page
///
/// # Arguments
///
/// * `payload` - Raw response body
/// * `page_number` - Page the payload belongs to, stamped on every record
///
/// # Returns
///
/// * `Ok(PageResult)` - Products in page order and the next-page signal
/// * `Err(ParseError)` - The payload is blank or not markup
///
/// # Example
///
/// ```
/// use shelf_scraper::crawler::parse_listing;
///
/// let html = r#"<html><body><ul>
///   <li class="product type-product">
///     <h2 class="woo-loop-product__title"><a href="https://shop.test/product/floss/">Floss</a></h2>
///     <span class="price"><bdi>₹120.00</bdi></span>
///   </li>
/// </ul><a class="next" href="/page/2/">Next</a></body></html>"#;
///
/// let page = parse_listing(html, 1).unwrap();
/// assert_eq!(page.products.len(), 1);
/// assert!(page.has_next);
/// ```
pub fn parse_listing(payload: &str, page_number: u32) -> Result<PageResult, ParseError> {
    let trimmed = payload.trim_start_matches('\u{feff}').trim_start();

    if trimmed.is_empty() {
        return Err(ParseError::EmptyPayload { page_number });
    }

    if !trimmed.starts_with('<') {
        return Err(ParseError::NotMarkup {
            page_number,
            preview: trimmed.chars().take(40).collect(),
        });
    }

    let document = Html::parse_document(payload);

    let blocks = PRODUCT_BLOCKS
        .iter()
        .map(|css| select_all(document.root_element(), css))
        .find(|blocks| !blocks.is_empty())
        .unwrap_or_default();

    let mut products = Vec::with_capacity(blocks.len());
    for (index, block) in blocks.into_iter().enumerate() {
        match extract_product(block, page_number) {
            Some(product) => products.push(product),
            None => tracing::warn!(
                "Page {}: skipping product block {} with no name",
                page_number,
                index + 1
            ),
        }
    }

    if products.is_empty() {
        tracing::info!("Page {}: no products found, treating as last page", page_number);
        return Ok(PageResult::empty(page_number));
    }

    let has_next = select_first(document.root_element(), NEXT_PAGE).is_some();

    Ok(PageResult::new(page_number, products, has_next))
}

/// Extracts one product; `None` when the block has no usable name
fn extract_product(block: ElementRef<'_>, page_number: u32) -> Option<ProductRecord> {
    let link = TITLE_LINKS.iter().find_map(|css| select_first(block, css));
    let product_url = link
        .and_then(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty());

    let name = TITLE_TEXT
        .iter()
        .filter_map(|css| select_first(block, css))
        .map(text_of)
        .chain(link.map(text_of))
        .find(|text| !text.is_empty())
        .or_else(|| product_url.as_deref().and_then(name_from_slug))?;

    let (price, sale) = extract_price(block);
    if !price.is_amount() {
        tracing::warn!("Page {}: no readable price for product: {}", page_number, name);
    }

    let record = ProductRecord::new(name, price, page_number)
        .ok()?
        .with_product_url(product_url)
        .with_image_url(extract_image(block));

    Some(match sale {
        Some(regular) => record.with_sale(regular, true),
        None => record,
    })
}

/// Returns the current price and, for sale listings, the regular price
fn extract_price(block: ElementRef<'_>) -> (Price, Option<Price>) {
    let Some(price_el) = select_first(block, "span.price, .price") else {
        return (Price::Unparseable { raw: String::new() }, None);
    };

    if let Some(sale) = select_first(price_el, "ins bdi").or_else(|| select_first(price_el, "ins")) {
        let regular = select_first(price_el, "del bdi")
            .or_else(|| select_first(price_el, "del"))
            .map(|el| Price::parse(&text_of(el)));
        return (Price::parse(&text_of(sale)), regular);
    }

    let current = select_first(price_el, "bdi").unwrap_or(price_el);
    (Price::parse(&text_of(current)), None)
}

/// Picks the real image source, skipping lazy-load SVG placeholders
fn extract_image(block: ElementRef<'_>) -> Option<String> {
    let img = select_first(block, "img")?;
    let attrs = img.value();

    let src = ["data-src", "data-lazy-src", "src"]
        .iter()
        .filter_map(|name| attrs.attr(name))
        .map(str::trim)
        .find(|value| !value.is_empty())?;

    if src.starts_with("data:image/svg") {
        return attrs
            .attr("srcset")
            .and_then(|srcset| srcset.split(',').next())
            .and_then(|candidate| candidate.split_whitespace().next())
            .map(str::to_string);
    }

    Some(src.to_string())
}

/// Derives a display name from a product URL slug
///
/// `https://shop.test/product/blue-floss/` becomes `Blue Floss`.
fn name_from_slug(url: &str) -> Option<String> {
    let tail = url.rsplit("product/").next()?.trim_end_matches('/');
    let slug = tail.rsplit('/').next()?;

    let name = slug
        .split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ");

    Some(name).filter(|n| !n.is_empty())
}

fn select_first<'a>(element: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    element.select(&selector).next()
}

fn select_all<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => element.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Element text with whitespace collapsed
fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_block(name: &str, href: &str, price_html: &str, img: &str) -> String {
        format!(
            r#"<li class="product type-product">
                 <a href="{href}">{img}</a>
                 <h2 class="woo-loop-product__title"><a href="{href}">{name}</a></h2>
                 {price_html}
               </li>"#
        )
    }

    fn page(blocks: &[String], next: bool) -> String {
        let next = if next {
            r#"<nav><a class="next page-numbers" href="/page/2/">→</a></nav>"#
        } else {
            ""
        };
        format!(
            "<!DOCTYPE html><html><head><title>Shop</title></head><body><ul class=\"products\">{}</ul>{}</body></html>",
            blocks.join("\n"),
            next
        )
    }

    #[test]
    fn test_parses_products_in_order() {
        let html = page(
            &[
                product_block(
                    "Dental Floss",
                    "https://shop.test/product/dental-floss/",
                    r#"<span class="price"><bdi>₹120.00</bdi></span>"#,
                    r#"<img src="https://cdn.test/floss.png">"#,
                ),
                product_block(
                    "Mouth Mirror",
                    "https://shop.test/product/mouth-mirror/",
                    r#"<span class="price"><bdi>₹1,450.50</bdi></span>"#,
                    r#"<img src="https://cdn.test/mirror.png">"#,
                ),
            ],
            true,
        );

        let result = parse_listing(&html, 1).unwrap();

        assert_eq!(result.page_number, 1);
        assert!(result.has_next);
        assert_eq!(result.products.len(), 2);
        assert_eq!(result.products[0].name(), "Dental Floss");
        assert_eq!(result.products[0].price(), &Price::Amount { minor_units: 12_000 });
        assert_eq!(result.products[0].image_url(), Some("https://cdn.test/floss.png"));
        assert_eq!(
            result.products[0].product_url(),
            Some("https://shop.test/product/dental-floss/")
        );
        assert_eq!(result.products[1].name(), "Mouth Mirror");
        assert_eq!(result.products[1].price(), &Price::Amount { minor_units: 145_050 });
        assert!(result.products.iter().all(|p| p.page_number() == 1));
    }

    #[test]
    fn test_sale_price_and_regular_price() {
        let html = page(
            &[product_block(
                "Brush",
                "https://shop.test/product/brush/",
                r#"<span class="price"><del><bdi>₹60.00</bdi></del> <ins><bdi>₹45.00</bdi></ins></span>"#,
                "",
            )],
            false,
        );

        let result = parse_listing(&html, 2).unwrap();
        let brush = &result.products[0];

        assert!(brush.on_sale());
        assert_eq!(brush.price(), &Price::Amount { minor_units: 4_500 });
        assert_eq!(brush.regular_price(), Some(&Price::Amount { minor_units: 6_000 }));
        assert!(!result.has_next);
    }

    #[test]
    fn test_missing_price_is_kept_as_unparseable() {
        let html = page(
            &[product_block("Kit", "https://shop.test/product/kit/", "", "")],
            false,
        );

        let result = parse_listing(&html, 1).unwrap();

        assert_eq!(result.products.len(), 1);
        assert!(!result.products[0].price().is_amount());
    }

    #[test]
    fn test_block_without_name_is_skipped() {
        let html = page(
            &[
                r#"<li class="product type-product"><span class="price"><bdi>10</bdi></span></li>"#
                    .to_string(),
                product_block(
                    "Floss",
                    "https://shop.test/product/floss/",
                    r#"<span class="price"><bdi>10</bdi></span>"#,
                    "",
                ),
            ],
            true,
        );

        let result = parse_listing(&html, 1).unwrap();

        assert_eq!(result.products.len(), 1);
        assert_eq!(result.products[0].name(), "Floss");
    }

    #[test]
    fn test_name_from_slug_when_title_is_empty() {
        let html = page(
            &[product_block(
                "",
                "https://shop.test/product/orthodontic-wax-xl/",
                r#"<span class="price"><bdi>10</bdi></span>"#,
                "",
            )],
            false,
        );

        let result = parse_listing(&html, 1).unwrap();
        assert_eq!(result.products[0].name(), "Orthodontic Wax Xl");
    }

    #[test]
    fn test_title_text_wins_over_slug() {
        let html = page(
            &[product_block(
                "Floss Picks, Mint (50 ct)",
                "https://shop.test/product/floss-pick-50ct/",
                r#"<span class="price"><bdi>10</bdi></span>"#,
                "",
            )],
            false,
        );

        let result = parse_listing(&html, 1).unwrap();
        assert_eq!(result.products[0].name(), "Floss Picks, Mint (50 ct)");
        assert_eq!(
            result.products[0].product_url(),
            Some("https://shop.test/product/floss-pick-50ct/")
        );
    }

    #[test]
    fn test_lazy_image_sources() {
        let html = page(
            &[
                product_block(
                    "Lazy",
                    "https://shop.test/product/lazy/",
                    "",
                    r#"<img src="placeholder.gif" data-src="https://cdn.test/lazy.png">"#,
                ),
                product_block(
                    "Svg",
                    "https://shop.test/product/svg/",
                    "",
                    r#"<img src="data:image/svg+xml;base64,AAA" srcset="https://cdn.test/svg-300.png 300w, https://cdn.test/svg-600.png 600w">"#,
                ),
            ],
            false,
        );

        let result = parse_listing(&html, 1).unwrap();

        assert_eq!(result.products[0].image_url(), Some("https://cdn.test/lazy.png"));
        assert_eq!(result.products[1].image_url(), Some("https://cdn.test/svg-300.png"));
    }

    #[test]
    fn test_empty_page_is_terminal_even_with_next_link() {
        let html = page(&[], true);

        let result = parse_listing(&html, 3).unwrap();

        assert!(result.products.is_empty());
        assert!(!result.has_next);
    }

    #[test]
    fn test_falls_back_to_plain_product_class() {
        let html = r#"<html><body><ul>
            <li class="product"><h3>Gloves</h3><span class="price">$5</span></li>
        </ul></body></html>"#;

        let result = parse_listing(html, 1).unwrap();

        assert_eq!(result.products.len(), 1);
        assert_eq!(result.products[0].name(), "Gloves");
        assert_eq!(result.products[0].price(), &Price::Amount { minor_units: 500 });
    }

    #[test]
    fn test_rel_next_link() {
        let html = r#"<html><head><link rel="next" href="/page/2/"></head><body><ul>
            <li class="product"><h2>Gloves</h2><span class="price">5</span></li>
        </ul></body></html>"#;

        assert!(parse_listing(html, 1).unwrap().has_next);
    }

    #[test]
    fn test_unrecognizable_payloads() {
        assert_eq!(
            parse_listing("   \n", 4).unwrap_err(),
            ParseError::EmptyPayload { page_number: 4 }
        );
        assert!(matches!(
            parse_listing(r#"{"error":"maintenance"}"#, 2).unwrap_err(),
            ParseError::NotMarkup { page_number: 2, .. }
        ));
    }

    #[test]
    fn test_name_from_slug() {
        assert_eq!(
            name_from_slug("https://shop.test/product/blue-floss/"),
            Some("Blue Floss".to_string())
        );
        assert_eq!(name_from_slug("https://shop.test/product/"), None);
    }
}

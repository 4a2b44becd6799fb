//! Integration tests for the scraper
//!
//! These tests use wiremock to serve a fake shop and run full scrape
//! sessions end-to-end against real storage backends.

use shelf_scraper::cache::{CacheKey, CacheStore, MemoryCache};
use shelf_scraper::config::{
    AuthConfig, Config, FetchConfig, ScraperConfig, StorageConfig, StorageKind,
};
use shelf_scraper::crawler::{scrape, FetchErrorKind, Fetcher, ScrapeOrchestrator, SessionSettings};
use shelf_scraper::output::{FailureKind, StopReason};
use shelf_scraper::storage::{JsonFileStorage, ProductStorage, SqliteStorage};
use shelf_scraper::PageResult;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock shop
fn create_test_config(base_url: &str, max_page: u32, dir: &Path) -> Config {
    Config {
        scraper: ScraperConfig {
            base_url: base_url.to_string(),
            max_page,
            crawl_delay_seconds: 0.0, // No politeness delay against the mock
            ..Default::default()
        },
        fetch: FetchConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
            timeout_secs: 5,
            connect_timeout_secs: 5,
            proxy: None,
        },
        auth: AuthConfig {
            token: Some("test-token".to_string()),
        },
        storage: StorageConfig {
            backend: StorageKind::Sqlite,
            database_path: dir.join("products.db").to_string_lossy().into_owned(),
            json_path: dir.join("products.json").to_string_lossy().into_owned(),
        },
        ..Default::default()
    }
}

/// Renders a listing page with the given `(name, price)` products
fn listing_page(products: &[(&str, &str)], has_next: bool) -> String {
    let items: String = products
        .iter()
        .map(|(name, price)| {
            let slug = name.to_lowercase().replace(' ', "-");
            format!(
                r#"<li class="product type-product">
                    <a href="/product/{slug}/"><img src="/images/{slug}.jpg" alt="{name}"></a>
                    <h2 class="woocommerce-loop-product__title"><a href="/product/{slug}/">{name}</a></h2>
                    <span class="price"><span class="amount"><bdi>${price}</bdi></span></span>
                </li>"#,
                slug = slug,
                name = name,
                price = price
            )
        })
        .collect();

    let next = if has_next {
        r#"<nav class="woocommerce-pagination"><a class="next page-numbers" href="?paged=next">→</a></nav>"#
    } else {
        ""
    };

    format!(
        "<!DOCTYPE html><html><head><title>Shop</title></head><body><ul class=\"products\">{}</ul>{}</body></html>",
        items, next
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_scrape_three_pages() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        listing_page(&[("Dental Floss", "3.99"), ("Tooth Brush", "5.49")], true),
    )
    .await;
    mount_page(
        &server,
        "/page/2/",
        listing_page(&[("Mouth Wash", "7.00"), ("Tongue Scraper", "2.25")], true),
    )
    .await;
    mount_page(&server, "/page/3/", listing_page(&[], false)).await;

    let config = create_test_config(&format!("{}/", server.uri()), 3, dir.path());
    let summary = scrape(&config).await.expect("session should start");

    assert_eq!(summary.pages_scraped, 3);
    assert_eq!(summary.products_persisted, 4);
    assert_eq!(summary.pages_failed(), 0);
    assert_eq!(summary.stop_reason, StopReason::NoNextPage);

    // Verify what landed in the database
    let storage = SqliteStorage::new(&dir.path().join("products.db")).unwrap();
    let products = storage.list().unwrap();
    assert_eq!(products.len(), 4);
    assert_eq!(products[0].name(), "Dental Floss");
    assert_eq!(products[0].price().minor_units(), Some(399));
    assert_eq!(products[0].page_number(), 1);
    assert_eq!(products[3].name(), "Tongue Scraper");
    assert_eq!(products[3].page_number(), 2);
    assert!(products[0]
        .image_url()
        .is_some_and(|url| url.ends_with("/images/dental-floss.jpg")));
}

#[tokio::test]
async fn test_not_found_on_second_page_ends_session() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        listing_page(&[("Dental Floss", "3.99"), ("Tooth Brush", "5.49")], true),
    )
    .await;
    // Page 2 is not mounted, so wiremock answers 404
    Mock::given(method("GET"))
        .and(path("/page/3/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[], false)))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), 3, dir.path());
    let summary = scrape(&config).await.expect("session should start");

    assert_eq!(summary.pages_scraped, 1);
    assert_eq!(summary.products_persisted, 2);
    assert_eq!(summary.pages_failed(), 1);
    assert_eq!(summary.failures[0].page_number, 2);
    assert_eq!(
        summary.failures[0].kind,
        FailureKind::Fetch(FetchErrorKind::NonRetryable { status: 404 })
    );
    assert_eq!(summary.stop_reason, StopReason::Aborted { page_number: 2 });

    let storage = SqliteStorage::new(&dir.path().join("products.db")).unwrap();
    assert_eq!(storage.count().unwrap(), 2);
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page(&[("Floss", "1.00")], false)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), 1, dir.path());
    let summary = scrape(&config).await.unwrap();

    assert_eq!(summary.pages_scraped, 1);
    assert_eq!(summary.pages_failed(), 0);
}

#[tokio::test]
async fn test_missing_token_fails_first_page_cleanly() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[], false)))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri(), 3, dir.path());
    config.auth.token = None;
    let summary = scrape(&config).await.unwrap();

    assert_eq!(summary.pages_scraped, 0);
    assert_eq!(summary.pages_failed(), 1);
    assert_eq!(
        summary.failures[0].kind,
        FailureKind::Fetch(FetchErrorKind::NonRetryable { status: 401 })
    );
}

#[tokio::test]
async fn test_server_errors_are_retried_up_to_max_attempts() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), 2, dir.path());
    let summary = scrape(&config).await.unwrap();

    assert_eq!(summary.pages_scraped, 0);
    assert!(matches!(
        summary.failures[0].kind,
        FailureKind::Fetch(FetchErrorKind::Transient { .. })
    ));
    assert_eq!(summary.stop_reason, StopReason::Aborted { page_number: 1 });
}

#[tokio::test]
async fn test_retry_recovers_after_rate_limit() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/", listing_page(&[("Floss", "1.00")], false)).await;

    let config = create_test_config(&server.uri(), 1, dir.path());
    let summary = scrape(&config).await.unwrap();

    assert_eq!(summary.pages_scraped, 1);
    assert_eq!(summary.products_persisted, 1);
    assert_eq!(summary.pages_failed(), 0);
}

#[tokio::test]
async fn test_repeated_runs_do_not_duplicate_rows() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        listing_page(&[("Dental Floss", "3.99"), ("Tooth Brush", "5.49")], false),
    )
    .await;

    for backend in [StorageKind::Sqlite, StorageKind::Json] {
        let mut config = create_test_config(&server.uri(), 1, dir.path());
        config.storage.backend = backend;

        scrape(&config).await.unwrap();
        scrape(&config).await.unwrap();
    }

    let sqlite = SqliteStorage::new(&dir.path().join("products.db")).unwrap();
    assert_eq!(sqlite.count().unwrap(), 2);

    let json = JsonFileStorage::new(dir.path().join("products.json"));
    assert_eq!(json.count().unwrap(), 2);
}

#[tokio::test]
async fn test_cached_pages_skip_the_network() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&[("Dental Floss", "3.99")], true)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page/2/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_page(&[("Mouth Wash", "7.00")], false)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), 5, dir.path());
    let cache = Arc::new(MemoryCache::new());

    let mut summaries = Vec::new();
    for _ in 0..2 {
        let storage = SqliteStorage::new(Path::new(&config.storage.database_path)).unwrap();
        let mut orchestrator = ScrapeOrchestrator::new(
            SessionSettings::from_config(&config),
            Fetcher::from_config(&config).unwrap(),
            Box::new(SharedMemoryCache(Arc::clone(&cache))),
            Box::new(storage),
        );
        summaries.push(orchestrator.run().await);
    }

    assert_eq!(summaries[0].pages_from_cache, 0);
    assert_eq!(summaries[1].pages_scraped, 2);
    assert_eq!(summaries[1].pages_from_cache, 2);
    assert_eq!(summaries[1].products_persisted, 2);
}

/// Lets consecutive sessions share one in-process cache
struct SharedMemoryCache(Arc<MemoryCache>);

#[async_trait::async_trait]
impl CacheStore for SharedMemoryCache {
    async fn get(&self, key: &CacheKey) -> Option<PageResult> {
        self.0.get(key).await
    }

    async fn put(&self, key: &CacheKey, page: &PageResult, ttl: chrono::Duration) {
        self.0.put(key, page, ttl).await
    }

    fn name(&self) -> &'static str {
        "shared-memory"
    }
}

use chrono::{TimeZone, Utc};
use std::path::Path;
use stockwatch::config::{parse_config, Config};
use stockwatch::document::{HtmlBrowser, HttpSource};
use stockwatch::storage::{CheckpointStore, ResultSet, ScrapeCheckpoint};
use stockwatch::{Badge, CatalogItem, RunState, ScrapeError, ScrapeOrchestrator, StartMode, StockStatus};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration scraping `{base}/search/?q=new` with no delays
fn create_test_config(base_url: &str, dir: &Path) -> Config {
    parse_config(&format!(
        r#"
[scraper]
throttle-delay-ms = 0
throttle-jitter-ms = 0
settle-delay-ms = 0
backoff-base-ms = 0
listing-retry-delay-ms = 0
item-retry-delay-ms = 0
grid-timeout-ms = 200
navigation-timeout-ms = 5000
page-timeout-ms = 5000

[output]
checkpoint-path = "{dir}/checkpoint.json"
results-path = "{dir}/results.json"
report-path = "{dir}/report.md"

[catalog]
family = "dss"
name = "Test Shop"

[[catalog.category]]
url = "{base}/search/?q=new"
badge = "New"
stock-status = "In Stock"

[selectors]
items = "div.product-grid ul.items div.product-item"
next-page-disabled = "li.pagination-next.disabled"
next-page-link = "li.pagination-next > a"
"#,
        dir = dir.display(),
        base = base_url
    ))
    .expect("Failed to parse test config")
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

/// A listing page with one stub per id and an optional next link
fn listing_page(ids: &[u32], next_page: Option<u32>) -> String {
    let items: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<div class="product-item"><div class="details-outer"><div>
                   <div class="details-inner"><a href="/item/p/{id}"><span>Item {id}</span></a></div>
                   <div class="colorswatch"></div></div></div></div>"#
            )
        })
        .collect();

    let pagination = match next_page {
        Some(page) => format!(
            r#"<li class="pagination-next"><a href="/search/?q=new&page={}&pageSize=">Next</a></li>"#,
            page
        ),
        None => r#"<li class="pagination-next disabled"><span>Next</span></li>"#.to_string(),
    };

    format!(
        r#"<html><head><title>New Arrivals</title></head><body>
           <div class="product-grid"><ul class="items">{}</ul><ul class="pages">{}</ul></div>
           </body></html>"#,
        items, pagination
    )
}

fn detail_page(id: u32, extra: &str) -> String {
    format!(
        r#"<html><head><title>Item {id}</title></head><body>
           <div class="product-details"><h1 class="name">Item {id}</h1>{extra}</div>
           </body></html>"#
    )
}

async fn mount_listing(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("page", page.to_string()))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_details(server: &MockServer, ids: &[u32]) {
    for &id in ids {
        mount_page(server, &format!("/item/p/{}", id), detail_page(id, "")).await;
    }
}

/// An item as an earlier run would have saved it
fn saved_item(base_url: &str, id: u32) -> CatalogItem {
    CatalogItem {
        name: format!("Saved {}", id),
        product_id: id.to_string(),
        source_url: format!("{}/item/p/{}", base_url, id),
        page_number: 1,
        position_on_page: id,
        badge: Badge::New,
        stock_status: StockStatus::InStock,
        has_variations: false,
        variations: vec![],
        retrieved_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn create_orchestrator(config: Config) -> ScrapeOrchestrator<HtmlBrowser<HttpSource>> {
    let source = HttpSource::from_config(&config.browser).expect("Failed to build HTTP client");
    ScrapeOrchestrator::new(HtmlBrowser::new(source), config)
}

#[tokio::test]
async fn test_full_scrape_two_pages() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 0, listing_page(&[1, 2, 3], Some(1))).await;
    mount_listing(&server, 1, listing_page(&[4, 5], None)).await;
    mount_details(&server, &[1, 2, 3, 4, 5]).await;

    let mut orchestrator = create_orchestrator(create_test_config(&server.uri(), dir.path()));
    let items = orchestrator.run(StartMode::Fresh).await.expect("Scrape failed");

    assert_eq!(items.len(), 5);
    assert_eq!(
        items.iter().map(|i| i.product_id.as_str()).collect::<Vec<_>>(),
        vec!["1", "2", "3", "4", "5"]
    );
    assert_eq!(items[3].page_number, 2);
    assert_eq!(items[3].position_on_page, 1);
    assert!(items.iter().all(|i| i.badge == Badge::New));
    assert!(items.iter().all(|i| i.stock_status == StockStatus::InStock));
    assert_eq!(orchestrator.state(), RunState::Terminated);

    // Results are persisted next to the checkpoint, suffixed by badge
    let store = CheckpointStore::for_category(&orchestrator.config().output, Badge::New);
    assert_eq!(store.load_results().unwrap().len(), 5);
    assert_eq!(
        store.load().unwrap(),
        Some(ScrapeCheckpoint {
            last_page_scraped: 1,
            last_position_scraped: 1,
            total_items_scraped: 5,
        })
    );
    assert!(dir.path().join("checkpoint_new.json").exists());
}

#[tokio::test]
async fn test_dropdown_item_is_partially_out_of_stock() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 0, listing_page(&[1, 2, 3, 4, 5], None)).await;
    mount_details(&server, &[1, 2, 4, 5]).await;

    mount_page(
        &server,
        "/item/p/3",
        detail_page(
            3,
            r#"<select class="variant-select">
                 <option value="">Select a Style...</option>
                 <option value="/item/p/3-red">Red</option>
                 <option value="/item/p/3-blue">Blue</option>
                 <option value="/item/p/3-green">Green</option>
               </select>"#,
        ),
    )
    .await;
    mount_page(&server, "/item/p/3-red", detail_page(3, "")).await;
    mount_page(
        &server,
        "/item/p/3-blue",
        detail_page(3, r#"<span class="stock-status out-of-stock">Out of stock</span>"#),
    )
    .await;
    mount_page(&server, "/item/p/3-green", detail_page(3, "")).await;

    let mut orchestrator = create_orchestrator(create_test_config(&server.uri(), dir.path()));
    let items = orchestrator.run(StartMode::Fresh).await.expect("Scrape failed");

    assert_eq!(items.len(), 5);
    let item = &items[2];
    assert_eq!(item.product_id, "3");
    assert_eq!(item.stock_status, StockStatus::PartiallyOutOfStock);
    assert_eq!(item.variations.len(), 3);
    assert_eq!(
        item.variations.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(),
        vec!["Red", "Blue", "Green"]
    );
    assert!(item.variations.iter().all(|v| v.parent_id == "3"));
    assert_eq!(item.out_of_stock_variations().count(), 1);
    assert_eq!(item.variations[1].variant_id, "3-blue");
    assert_eq!(item.variations[1].stock_status, StockStatus::OutOfStock);

    // Items without variants keep the category status
    assert_eq!(items[0].stock_status, StockStatus::InStock);
}

#[tokio::test]
async fn test_resume_from_checkpoint() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 0, listing_page(&[1, 2, 3], Some(1))).await;
    mount_listing(&server, 1, listing_page(&[4], None)).await;
    mount_details(&server, &[3, 4]).await;

    // Item 1 was finished by the interrupted run; item 2 is the restart point
    Mock::given(method("GET"))
        .and(path("/item/p/1"))
        .respond_with(html(detail_page(1, "")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/p/2"))
        .respond_with(html(detail_page(2, "")))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), dir.path());
    let saved: Vec<CatalogItem> = [1, 2]
        .iter()
        .map(|&id| saved_item(&server.uri(), id))
        .collect();
    CheckpointStore::for_category(&config.output, Badge::New)
        .save(
            &ScrapeCheckpoint {
                last_page_scraped: 0,
                last_position_scraped: 1,
                total_items_scraped: 2,
            },
            &ResultSet::from_items(saved),
        )
        .unwrap();

    let mut orchestrator = create_orchestrator(config);
    assert!(orchestrator.has_checkpoint());

    let items = orchestrator.run(StartMode::Resume).await.expect("Resume failed");

    assert_eq!(
        items.iter().map(|i| i.product_id.as_str()).collect::<Vec<_>>(),
        vec!["1", "2", "3", "4"]
    );
    // The reprocessed item replaced its saved copy
    assert_eq!(items[1].name, "Item 2");
    assert_ne!(items[1].retrieved_at, items[0].retrieved_at);
}

#[tokio::test]
async fn test_missing_grid_preserves_checkpoint() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 0, listing_page(&[1, 2], Some(1))).await;
    mount_listing(
        &server,
        1,
        "<html><body><p>Down for maintenance</p></body></html>".to_string(),
    )
    .await;
    mount_details(&server, &[1, 2]).await;

    let mut orchestrator = create_orchestrator(create_test_config(&server.uri(), dir.path()));
    let err = orchestrator.run(StartMode::Fresh).await.unwrap_err();

    assert!(matches!(err, ScrapeError::GridNotLoaded { .. }));
    assert_eq!(orchestrator.state(), RunState::Terminated);

    let store = CheckpointStore::for_category(&orchestrator.config().output, Badge::New);
    assert_eq!(
        store.load().unwrap(),
        Some(ScrapeCheckpoint {
            last_page_scraped: 0,
            last_position_scraped: 1,
            total_items_scraped: 2,
        })
    );
    assert_eq!(store.load_results().unwrap().len(), 2);
}

#[tokio::test]
async fn test_last_page_without_next_link() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_listing(&server, 0, listing_page(&[7], None)).await;
    mount_details(&server, &[7]).await;

    // No other listing page may be requested
    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("page", "1"))
        .respond_with(html(listing_page(&[], None)))
        .expect(0)
        .mount(&server)
        .await;

    let mut orchestrator = create_orchestrator(create_test_config(&server.uri(), dir.path()));
    let items = orchestrator.run(StartMode::Fresh).await.expect("Scrape failed");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].page_number, 1);
}

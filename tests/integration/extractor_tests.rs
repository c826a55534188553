//! Integration tests for the extractor protocol
//!
//! These tests build extractors from TOML exactly as the binary does and
//! feed them captured storefront pages, checking the tasks they emit.

use storefront_crawler::config::parse_config;
use storefront_crawler::extractor::Extractor;
use storefront_crawler::sites::build_extractor;
use storefront_crawler::state::label_key;
use storefront_crawler::task::FetchedResponse;
use storefront_crawler::{CrawlState, ExtractError, PageKind, Task};
use url::Url;

const CONFIG: &str = r#"
[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
records-path = "records.jsonl"

[[site]]
name = "demo"
domains = ["*.demo-shop.com"]
seeds = ["https://www.demo-shop.com/"]
brand = "Demo"
block-markers = ["queue-it"]

[site.routes]
root = ["^/$"]
listing = ["^/c/"]
detail = ['^/p/[\w-]+(\?|$)']

[site.navigation]
menu = "nav.main > ul"

[site.listing]
item-link = "li.tile a.title"
next-page = "a[rel=next]"
total-count = ".result-count"

[site.fetch]
reliability = "medium"
headless-detail = true
js-wait-ms = 2000
"#;

fn extractor() -> Extractor {
    let config = parse_config(CONFIG).unwrap();
    build_extractor(&config.sites[0]).unwrap()
}

fn page(path: &str) -> Url {
    Url::parse("https://www.demo-shop.com").unwrap().join(path).unwrap()
}

fn parse(
    state: &CrawlState,
    path: &str,
    body: &str,
) -> Result<Vec<(CrawlState, Task)>, ExtractError> {
    let mut tasks = Vec::new();
    extractor().parse(state, &FetchedResponse::ok(page(path), body), &mut tasks)?;
    Ok(tasks)
}

#[test]
fn test_root_page_two_categories() {
    let body = r#"<html><body>
        <nav class="main"><ul>
            <li><span>Women</span>
                <ul><li><a href="/c/women-dresses">Dresses</a></li></ul>
            </li>
            <li><span>Men</span>
                <ul><li><a href="/c/men-shirts">Shirts</a></li></ul>
            </li>
        </ul></nav>
    </body></html>"#;

    let tasks = parse(&CrawlState::new(), "/", body).unwrap();
    assert_eq!(tasks.len(), 2);

    let labels: Vec<(Option<&str>, Option<&str>)> = tasks
        .iter()
        .map(|(state, _)| {
            (
                state.label(&label_key(0)),
                state.label(&label_key(1)),
            )
        })
        .collect();
    assert_eq!(
        labels,
        vec![
            (Some("Women"), Some("Dresses")),
            (Some("Men"), Some("Shirts")),
        ]
    );

    for (state, task) in &tasks {
        assert_eq!(state.item_index(), 0);
        let fetch = task.as_fetch().unwrap();
        assert!(fetch.url.path().starts_with("/c/"));
        assert!(!fetch.options.headless_render);
    }
}

#[test]
fn test_listing_page_with_next_link() {
    let tiles: String = (1..=24)
        .map(|i| {
            format!(
                r#"<li class="tile"><a class="img" href="/p/item-{i}"></a><a class="title" href="/p/item-{i}">Item {i}</a></li>"#
            )
        })
        .collect();
    let body = format!(
        r#"<ul class="grid">{}</ul><a rel="next" href="/c/men-shirts?page=2">Next</a>"#,
        tiles
    );

    let state = CrawlState::new()
        .with_label(label_key(0), "Men")
        .with_label(label_key(1), "Shirts");
    let tasks = parse(&state, "/c/men-shirts", &body).unwrap();
    assert_eq!(tasks.len(), 25);

    let indexes: Vec<u64> = tasks.iter().map(|(s, _)| s.item_index()).collect();
    let expected: Vec<u64> = (1..=24).chain(std::iter::once(24)).collect();
    assert_eq!(indexes, expected);

    let (_, detail) = &tasks[0];
    let detail = detail.as_fetch().unwrap();
    assert_eq!(detail.url, page("/p/item-1"));
    assert!(detail.options.headless_render);
    assert_eq!(detail.dedupe_key(), "https://www.demo-shop.com/p/item-1");

    let (continued, next) = tasks.last().unwrap();
    assert_eq!(next.as_fetch().unwrap().url, page("/c/men-shirts?page=2"));
    assert_eq!(continued.breadcrumb(), vec!["Men", "Shirts"]);
}

#[test]
fn test_empty_listing_page() {
    let tasks = parse(
        &CrawlState::new(),
        "/c/men-shirts?page=9",
        r#"<ul class="grid"></ul>"#,
    )
    .unwrap();
    assert!(tasks.is_empty());
}

#[test]
fn test_last_page_stops_at_total() {
    let body = r#"
        <p class="result-count">Showing 25-26 of 26 products</p>
        <ul class="grid">
            <li class="tile"><a class="title" href="/p/a">A</a></li>
            <li class="tile"><a class="title" href="/p/b">B</a></li>
        </ul>
        <a rel="next" href="/c/men-shirts?page=3">Next</a>"#;

    let tasks = parse(&CrawlState::new().with_item_index(24), "/c/men-shirts?page=2", body).unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks
        .iter()
        .all(|(_, t)| t.as_fetch().unwrap().url.path().starts_with("/p/")));
}

#[test]
fn test_detail_with_three_colors() {
    let body = r#"<html><body>
        <script type="application/json" id="product-data">
        {"id": "SH-1", "name": "Oxford Shirt", "currency": "USD", "price": 49.0,
         "colors": [
            {"name": "Blue", "url": "/p/oxford-shirt?color=blue",
             "sizes": [{"label": "S"}, {"label": "M", "available": false}]},
            {"name": "White", "url": "/p/oxford-shirt-white"},
            {"name": "Pink", "url": "https://www.demo-shop.com/p/oxford-shirt-pink"}
         ]}
        </script>
    </body></html>"#;

    let state = CrawlState::new()
        .with_label(label_key(0), "Men")
        .with_item_index(5);
    let tasks = parse(&state, "/p/oxford-shirt", body).unwrap();

    let records: Vec<_> = tasks.iter().filter_map(|(_, t)| t.as_record()).collect();
    assert_eq!(records.len(), 1);
    let product = &records[0].product;
    assert_eq!(product.site, "demo");
    assert_eq!(product.brand.as_deref(), Some("Demo"));
    assert_eq!(product.product_id, "SH-1");
    assert_eq!(product.crawl_index, 5);
    assert_eq!(product.categories, vec!["Men"]);
    assert_eq!(product.variants.len(), 1);
    assert_eq!(product.variants[0].color, "Blue");
    assert_eq!(product.combination_count(), 2);
    assert!(product.is_available());

    let siblings: Vec<_> = tasks
        .iter()
        .filter_map(|(s, t)| t.as_fetch().map(|f| (s, f)))
        .collect();
    assert_eq!(siblings.len(), 2);
    for (sibling_state, fetch) in siblings {
        assert_eq!(sibling_state.item_index(), 0);
        assert_eq!(sibling_state.label("Category"), Some("Men"));
        assert!(fetch.url.path().starts_with("/p/oxford-shirt-"));
    }
}

#[test]
fn test_interstitial_is_blocked_not_failed() {
    let bodies = [
        r#"<html><body><div class="g-recaptcha" data-sitekey="x"></div></body></html>"#,
        r#"<html><script src="https://static.queue-it.net/script/queueclient.js"></script></html>"#,
    ];
    for body in bodies {
        let error = parse(&CrawlState::new(), "/p/oxford-shirt", body).unwrap_err();
        assert!(
            matches!(error, ExtractError::BlockedByRemote { .. }),
            "expected a block, got {:?}",
            error
        );
    }
}

#[test]
fn test_missing_product_data_is_extraction_failure() {
    let error = parse(&CrawlState::new(), "/p/oxford-shirt", "<html><body></body></html>").unwrap_err();
    assert!(matches!(error, ExtractError::ExtractionFailed { .. }));
}

#[test]
fn test_classification_is_total_and_deterministic() {
    let extractor = extractor();
    let cases = [
        ("/", Ok(PageKind::Root)),
        ("/c/men-shirts", Ok(PageKind::Listing)),
        ("/c/men-shirts?page=4", Ok(PageKind::Listing)),
        ("/p/oxford-shirt", Ok(PageKind::Detail)),
        ("/stores/berlin", Err(())),
    ];

    for (path, expected) in cases {
        for _ in 0..2 {
            let kind = extractor.classify(&page(path)).map_err(|_| ());
            assert_eq!(kind, expected, "classification of {}", path);
        }
    }
}

#[test]
fn test_canonical_url_is_idempotent() {
    let extractor = extractor();
    for raw in [
        "/p/oxford-shirt?color=blue&utm_source=mail",
        "/p/oxford-shirt#reviews",
        "/p/oxford-shirt",
    ] {
        let once = extractor.canonical_url(&page(raw));
        assert_eq!(extractor.canonical_url(&once), once);
        assert_eq!(once, page("/p/oxford-shirt"));
    }
}

#[test]
fn test_self_test_validation_of_captured_root() {
    let extractor = extractor();
    let seed = extractor.seeds()[0].clone();
    let body = r#"<nav class="main"><ul><li><a href="/c/sale">Sale</a></li></ul></nav>"#;

    let summary = extractor.validate(&FetchedResponse::ok(seed.clone(), body)).unwrap();
    assert_eq!(summary.kind, PageKind::Root);
    assert_eq!(summary.fetches, 1);
    assert_eq!(summary.records, 0);

    let drifted = extractor.validate(&FetchedResponse::ok(seed, "<nav><div>new menu</div></nav>"));
    assert!(matches!(drifted, Err(ExtractError::ExtractionFailed { .. })));
}

#[test]
fn test_captcha_widget_on_regular_page_with_defaults_off() {
    let body = r#"<html><body>
        <script type="application/json" id="product-data">
        {"id": "SH-2", "name": "Flannel Shirt", "currency": "USD", "price": 59.0}
        </script>
        <footer><form class="newsletter"><div class="g-recaptcha" data-sitekey="k"></div></form></footer>
    </body></html>"#;
    let response = FetchedResponse::ok(page("/p/flannel-shirt"), body);

    let strict = extractor().validate(&response).unwrap_err();
    assert!(matches!(strict, ExtractError::BlockedByRemote { .. }));

    let relaxed = CONFIG.replace(
        r#"block-markers = ["queue-it"]"#,
        "block-markers = [\"queue-it\"]\ndefault-block-markers = false",
    );
    let config = parse_config(&relaxed).unwrap();
    assert!(!config.sites[0].default_block_markers);
    let extractor = build_extractor(&config.sites[0]).unwrap();

    let summary = extractor.validate(&response).unwrap();
    assert_eq!(summary.kind, PageKind::Detail);
    assert_eq!(summary.records, 1);

    // Site-specific markers still apply
    let queued = FetchedResponse::ok(
        page("/p/flannel-shirt"),
        r#"<script src="https://static.queue-it.net/queueclient.js"></script>"#,
    );
    assert!(matches!(
        extractor.validate(&queued),
        Err(ExtractError::BlockedByRemote { .. })
    ));
}

#[test]
fn test_swatch_links_outside_detail_routes_stay_inline() {
    let body = r#"<script type="application/json" id="product-data">
        {"id": "SH-3", "name": "Chambray Shirt",
         "colors": [
            {"name": "Indigo", "url": "/p/chambray-shirt-indigo"},
            {"name": "Gift wrap", "url": "/gift-cards"},
            {"name": "Grey", "url": "https://outlet.example.org/p/chambray-grey"}
         ]}
        </script>"#;

    let tasks = parse(&CrawlState::new(), "/p/chambray-shirt", body).unwrap();
    let fetches: Vec<_> = tasks.iter().filter_map(|(_, t)| t.as_fetch()).collect();
    assert_eq!(fetches.len(), 1);
    assert_eq!(fetches[0].url, page("/p/chambray-shirt-indigo"));

    let product = &tasks
        .iter()
        .find_map(|(_, t)| t.as_record())
        .unwrap()
        .product;
    let colors: Vec<&str> = product.variants.iter().map(|v| v.color.as_str()).collect();
    assert_eq!(colors, vec!["Gift wrap", "Grey"]);
}

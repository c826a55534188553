//! End-to-end crawl tests
//!
//! A wiremock server plays the storefront; the crawl runs in direct mode
//! through the same entry point the binary uses.

use storefront_crawler::config::{parse_config, Config};
use storefront_crawler::controller::run_crawl;
use storefront_crawler::output::{build_sinks, MemorySink, SqliteSink};
use storefront_crawler::product::Product;
use storefront_crawler::{CrawlError, FailureKind};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer, sites: &str, extra: &str) -> Config {
    let toml = format!(
        r#"
[controller]
max-concurrent-fetches = 4
max-retries = 2
retry-delay-ms = 10
{extra}

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
records-path = "records.jsonl"

{sites}
"#,
        extra = extra,
        sites = sites.replace("{base}", &server.uri()),
    );
    parse_config(&toml).unwrap()
}

const HTML_SITE: &str = r#"
[[site]]
name = "demo"
domains = ["127.0.0.1"]
seeds = ["{base}/"]
brand = "Demo"

[site.routes]
root = ["^/$"]
listing = ["^/c/"]
detail = ["^/p/"]

[site.listing]
item-link = "a.tile"
next-page = "a.next"

[site.fetch]
use-proxy = false
"#;

const JSON_SITE: &str = r#"
[[site]]
name = "api"
domains = ["127.0.0.1"]
seeds = ["{base}/"]

[site.routes]
root = ["^/$"]
listing = ["^/api/search"]
detail = ["^/p/"]

[site.listing]
format = "json"
items-pointer = "/results"
item-url-field = "href"
total-pointer = "/total"
offset-param = "start"

[site.fetch]
use-proxy = false
"#;

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

fn json(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

fn product_page(id: &str, name: &str, colors: &str) -> String {
    format!(
        r#"<html><body><h1>{name}</h1>
        <script type="application/json" id="product-data">
        {{"id": "{id}", "name": "{name}", "currency": "EUR", "price": 19.99, "colors": [{colors}]}}
        </script></body></html>"#
    )
}

async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_html_store(server: &MockServer) {
    mount_page(
        server,
        "/",
        html(
            r#"<nav><ul>
                <li><span>Men</span><ul><li><a href="/c/shirts">Shirts</a></li></ul></li>
                <li><a href="/c/bags">Bags</a></li>
                <li><a href="/about">About us</a></li>
            </ul></nav>"#,
        ),
    )
    .await;

    mount_page(
        server,
        "/c/shirts",
        html(
            r#"<a class="tile" href="/p/oxford">Oxford</a>
               <a class="tile" href="/p/linen">Linen</a>
               <a class="next" href="/c/shirts/2">Next</a>"#,
        ),
    )
    .await;
    mount_page(
        server,
        "/c/shirts/2",
        html(r#"<a class="tile" href="/p/polo">Polo</a>"#),
    )
    .await;
    mount_page(
        server,
        "/c/bags",
        html(
            r#"<a class="tile" href="/p/oxford">Oxford</a>
               <a class="tile" href="/p/tote">Tote</a>"#,
        ),
    )
    .await;

    mount_page(
        server,
        "/p/oxford",
        html(&product_page(
            "OX-1",
            "Oxford Shirt",
            r#"{"name": "Blue", "sizes": [{"label": "M"}]},
               {"name": "White", "url": "/p/oxford-white"}"#,
        )),
    )
    .await;
    mount_page(
        server,
        "/p/oxford-white",
        html(&product_page(
            "OX-2",
            "Oxford Shirt White",
            r#"{"name": "Blue", "url": "/p/oxford"},
               {"name": "White", "sizes": [{"label": "M", "available": false}]}"#,
        )),
    )
    .await;
    mount_page(
        server,
        "/p/linen",
        html(&product_page("LI-1", "Linen Shirt", "")),
    )
    .await;
    mount_page(server, "/p/tote", html(&product_page("TO-1", "Tote Bag", ""))).await;

    // The first visit to the polo page hits a captcha wall
    Mock::given(method("GET"))
        .and(path("/p/polo"))
        .respond_with(html(
            r#"<html><body><div class="g-recaptcha"></div></body></html>"#,
        ))
        .up_to_n_times(1)
        .mount(server)
        .await;
    mount_page(server, "/p/polo", html(&product_page("PO-1", "Polo", ""))).await;
}

async fn mount_json_store(server: &MockServer) {
    mount_page(
        server,
        "/",
        html(r#"<nav><ul><li><a href="/api/search?start=0">All</a></li></ul></nav>"#),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(query_param("start", "0"))
        .respond_with(json(serde_json::json!({
            "total": 3,
            "results": [{"href": "/p/a"}, {"href": "/p/b"}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .and(query_param("start", "2"))
        .respond_with(json(serde_json::json!({
            "total": 3,
            "results": [{"href": "/p/c"}]
        })))
        .mount(server)
        .await;

    for (id, name) in [("a", "Item A"), ("b", "Item B"), ("c", "Item C")] {
        mount_page(server, &format!("/p/{}", id), html(&product_page(id, name, ""))).await;
    }
}

fn find<'a>(records: &'a [Product], id: &str) -> &'a Product {
    records
        .iter()
        .find(|p| p.product_id == id)
        .unwrap_or_else(|| panic!("no record for {}", id))
}

#[tokio::test]
async fn test_html_storefront_crawl() {
    let server = MockServer::start().await;
    mount_html_store(&server).await;

    let config = config(&server, HTML_SITE, "");
    let mut sink = MemorySink::new();
    let stats = run_crawl(&config, None, &mut sink).await.unwrap();

    let records = sink.records();
    assert_eq!(records.len(), 5);
    assert_eq!(stats.records, 5);
    assert_eq!(stats.records_by_site.get("demo"), Some(&5));

    // root, two listings, one continuation, five details and one retry
    assert_eq!(stats.fetches, 10);
    // /p/oxford is linked from both listings and from its sibling
    assert_eq!(stats.duplicates, 2);
    assert_eq!(stats.retries, 1);
    assert_eq!(stats.abandoned, 0);
    assert_eq!(stats.failures.get(&FailureKind::BlockedByRemote), Some(&1));

    let polo = find(&records, "PO-1");
    assert_eq!(polo.categories, vec!["Men", "Shirts"]);
    assert_eq!(polo.crawl_index, 3);
    assert_eq!(polo.brand.as_deref(), Some("Demo"));

    let tote = find(&records, "TO-1");
    assert_eq!(tote.categories, vec!["Bags"]);
    assert_eq!(tote.crawl_index, 2);

    let oxford = find(&records, "OX-1");
    assert_eq!(oxford.variants.len(), 1);
    assert_eq!(oxford.variants[0].color, "Blue");
    assert!(oxford.canonical_url.ends_with("/p/oxford"));

    let sibling = find(&records, "OX-2");
    assert_eq!(sibling.crawl_index, 0);
    assert!(!sibling.is_available());
}

#[tokio::test]
async fn test_json_listing_offset_pagination() {
    let server = MockServer::start().await;
    mount_json_store(&server).await;

    let config = config(&server, JSON_SITE, "");
    let mut sink = MemorySink::new();
    let stats = run_crawl(&config, None, &mut sink).await.unwrap();

    let mut records = sink.records();
    records.sort_by_key(|p| p.crawl_index);
    let indexed: Vec<(&str, u64)> = records
        .iter()
        .map(|p| (p.product_id.as_str(), p.crawl_index))
        .collect();
    assert_eq!(indexed, vec![("a", 1), ("b", 2), ("c", 3)]);
    assert!(records.iter().all(|p| p.categories == vec!["All"]));

    assert_eq!(stats.fetches, 6);
    assert_eq!(stats.pages_by_kind.get("listing"), Some(&2));
    assert_eq!(stats.total_failures(), 0);
}

#[tokio::test]
async fn test_records_reach_every_configured_output() {
    let server = MockServer::start().await;
    mount_json_store(&server).await;

    let dir = TempDir::new().unwrap();
    let mut config = config(&server, JSON_SITE, "");
    config.output.records_path = dir.path().join("out/records.jsonl").display().to_string();
    config.output.database_path = Some(dir.path().join("records.db").display().to_string());

    {
        let mut sinks = build_sinks(&config.output).unwrap();
        run_crawl(&config, None, &mut sinks).await.unwrap();
    }

    let lines = std::fs::read_to_string(&config.output.records_path).unwrap();
    let written: Vec<Product> = lines
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(written.len(), 3);

    let database = SqliteSink::open(&dir.path().join("records.db")).unwrap();
    assert_eq!(database.count().unwrap(), 3);
    let stored = database
        .get(&format!("{}/p/b", server.uri()))
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Item B");
    assert_eq!(stored.site, "api");
}

#[tokio::test]
async fn test_fetch_cap_drops_remaining_work() {
    let server = MockServer::start().await;
    mount_html_store(&server).await;

    let config = config(&server, HTML_SITE, "max-fetches = 1");
    let mut sink = MemorySink::new();
    let stats = run_crawl(&config, None, &mut sink).await.unwrap();

    assert_eq!(stats.fetches, 1);
    assert_eq!(stats.capped, 2);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_missing_detail_is_abandoned_not_fatal() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html(r#"<nav><ul><li><a href="/c/all">All</a></li></ul></nav>"#),
    )
    .await;
    mount_page(
        &server,
        "/c/all",
        html(r#"<a class="tile" href="/p/gone">Gone</a><a class="tile" href="/p/here">Here</a>"#),
    )
    .await;
    mount_page(&server, "/p/gone", ResponseTemplate::new(404)).await;
    mount_page(&server, "/p/here", html(&product_page("H-1", "Here", ""))).await;

    let config = config(&server, HTML_SITE, "");
    let mut sink = MemorySink::new();
    let stats = run_crawl(&config, None, &mut sink).await.unwrap();

    assert_eq!(sink.len(), 1);
    // A 404 is abandoned at once, without a rendering retry
    assert_eq!(stats.failures.get(&FailureKind::Gone), Some(&1));
    assert_eq!(stats.failures.get(&FailureKind::ExtractionFailed), None);
    assert_eq!(stats.retries, 0);
    assert_eq!(stats.abandoned, 1);
    assert_eq!(stats.fetches, 4);
}

#[tokio::test]
async fn test_single_site_selection() {
    let server = MockServer::start().await;
    mount_json_store(&server).await;

    let sites = format!("{}\n{}", JSON_SITE, HTML_SITE.replace("127.0.0.1", "shop.invalid"));
    let config = config(&server, &sites, "");

    let mut sink = MemorySink::new();
    let stats = run_crawl(&config, Some("api"), &mut sink).await.unwrap();
    assert_eq!(stats.records_by_site.len(), 1);
    assert_eq!(stats.records_by_site.get("api"), Some(&3));

    let error = run_crawl(&config, Some("missing"), &mut MemorySink::new())
        .await
        .unwrap_err();
    assert!(matches!(error, CrawlError::UnknownSite(name) if name == "missing"));
}

//! Integration tests for fetch execution
//!
//! A wiremock server stands in for the proxy gateway (or, for the direct
//! fetcher, for the storefront itself).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;
use std::time::Duration;
use storefront_crawler::config::{parse_config, UserAgentConfig};
use storefront_crawler::extractor::run_self_tests;
use storefront_crawler::gateway::{DirectFetcher, Fetcher, GatewayClient};
use storefront_crawler::sites::build_extractors;
use storefront_crawler::task::{FetchOptions, FetchTask, ReliabilityTier};
use storefront_crawler::{FailureKind, FetchError};
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GatewayClient {
    GatewayClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

fn task(url: &str) -> FetchTask {
    FetchTask::get(Url::parse(url).unwrap(), FetchOptions::new())
}

fn reply(status: u16, body: &str) -> serde_json::Value {
    json!({
        "status": status,
        "protocol": "HTTP/2",
        "headers": {"Content-Type": ["text/html"]},
        "body": STANDARD.encode(body),
        "durationMs": 850,
        "avgDurationMs": 700
    })
}

#[tokio::test]
async fn test_gateway_request_carries_options() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/fetch"))
        .and(body_partial_json(json!({
            "method": "GET",
            "url": "https://shop.example.com/p/42",
            "headers": {"Accept": ["text/html"]},
            "options": {
                "useProxy": true,
                "reliability": "high",
                "headlessRender": true,
                "jsWaitMs": 1500,
                "dedupeKeys": ["https://shop.example.com/p/42"]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply(200, "<h1>OK</h1>")))
        .expect(1)
        .mount(&server)
        .await;

    let options = FetchOptions::new()
        .with_proxy(ReliabilityTier::High)
        .with_headless(Duration::from_millis(1500))
        .with_dedupe_key("https://shop.example.com/p/42");
    let task = FetchTask::get(Url::parse("https://shop.example.com/p/42").unwrap(), options)
        .with_header("Accept", "text/html");

    let response = client(&server).execute(&task).await.unwrap();

    assert_eq!(response.url, task.url);
    assert_eq!(response.status, 200);
    assert_eq!(response.protocol, "HTTP/2");
    assert_eq!(response.text(), "<h1>OK</h1>");
    assert_eq!(response.header("content-type"), Some("text/html"));

    let timing = response.timing.unwrap();
    assert_eq!(timing.duration, Duration::from_millis(850));
    assert_eq!(timing.average_duration, Duration::from_millis(700));
}

#[tokio::test]
async fn test_remote_status_is_passed_through() {
    let server = MockServer::start().await;

    // The storefront answered 404; the gateway itself succeeded
    Mock::given(method("POST"))
        .and(path("/v1/fetch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 404})))
        .mount(&server)
        .await;

    let response = client(&server)
        .execute(&task("https://shop.example.com/p/gone"))
        .await
        .unwrap();
    assert_eq!(response.status, 404);
    assert!(response.body.is_empty());
    assert!(response.timing.is_none());
}

#[tokio::test]
async fn test_gateway_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/fetch"))
        .and(body_partial_json(json!({"url": "https://shop.example.com/busy"})))
        .respond_with(ResponseTemplate::new(503).set_body_string("pool exhausted\n"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/fetch"))
        .and(body_partial_json(json!({"url": "https://shop.example.com/bad"})))
        .respond_with(ResponseTemplate::new(400).set_body_string("unknown option"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/fetch"))
        .and(body_partial_json(json!({"url": "https://shop.example.com/garbled"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client(&server);

    let busy = client
        .execute(&task("https://shop.example.com/busy"))
        .await
        .unwrap_err();
    assert!(
        matches!(&busy, FetchError::Gateway { status: 503, message } if message == "pool exhausted")
    );
    assert!(busy.is_retryable());

    let bad = client
        .execute(&task("https://shop.example.com/bad"))
        .await
        .unwrap_err();
    assert!(matches!(bad, FetchError::Gateway { status: 400, .. }));
    assert!(!bad.is_retryable());

    let garbled = client
        .execute(&task("https://shop.example.com/garbled"))
        .await
        .unwrap_err();
    assert!(matches!(garbled, FetchError::Decode { .. }));
}

#[tokio::test]
async fn test_unreachable_gateway_is_retryable() {
    let server = MockServer::builder().start().await;
    let endpoint = server.uri();
    drop(server);

    let client = GatewayClient::new(&endpoint, Duration::from_secs(2)).unwrap();
    let error = client
        .execute(&task("https://shop.example.com/"))
        .await
        .unwrap_err();
    assert!(error.is_retryable());
}

#[test]
fn test_route_is_fixed() {
    let client = GatewayClient::new("http://gateway.internal:8191/base/", Duration::from_secs(5)).unwrap();
    assert_eq!(client.route().as_str(), "http://gateway.internal:8191/v1/fetch");
}

#[tokio::test]
async fn test_self_tests_through_gateway() {
    let server = MockServer::start().await;

    let config = parse_config(&format!(
        r#"
[gateway]
mode = "gateway"
endpoint = "{}"

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
records-path = "records.jsonl"

[[site]]
name = "healthy"
domains = ["healthy.example.com"]
seeds = ["https://healthy.example.com/"]
routes = {{ root = ["^/$"], listing = ["^/c/"] }}

[[site]]
name = "drifted"
domains = ["drifted.example.com"]
seeds = ["https://drifted.example.com/"]
routes = {{ root = ["^/$"], listing = ["^/c/"] }}

[[site]]
name = "walled"
domains = ["walled.example.com"]
seeds = ["https://walled.example.com/"]
routes = {{ root = ["^/$"], listing = ["^/c/"] }}
"#,
        server.uri()
    ))
    .unwrap();

    let pages = [
        (
            "https://healthy.example.com/",
            r#"<nav><ul><li><a href="/c/new">New in</a></li></ul></nav>"#,
        ),
        (
            "https://drifted.example.com/",
            r#"<header><div class="menu-v2"><a href="/c/new">New in</a></div></header>"#,
        ),
        (
            "https://walled.example.com/",
            r#"<html><body><div id="px-captcha"></div></body></html>"#,
        ),
    ];
    for (url, body) in pages {
        Mock::given(method("POST"))
            .and(path("/v1/fetch"))
            .and(body_partial_json(json!({"url": url})))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(200, body)))
            .mount(&server)
            .await;
    }

    let extractors = build_extractors(&config, None).unwrap();
    let report = run_self_tests(&extractors, &client(&server)).await;

    assert_eq!(report.results.len(), 3);
    assert!(!report.is_success());
    assert_eq!(report.failed_sites(), vec!["drifted", "walled"]);

    let kinds: Vec<(&str, Option<FailureKind>)> = report
        .results
        .iter()
        .map(|r| (r.site.as_str(), r.failure_kind()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("healthy", None),
            ("drifted", Some(FailureKind::ExtractionFailed)),
            ("walled", Some(FailureKind::BlockedByRemote)),
        ]
    );
}

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

#[tokio::test]
async fn test_direct_fetch_identifies_itself() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/c/shirts"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact; test@example.com)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("<ul></ul>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = DirectFetcher::new(&user_agent()).unwrap();
    let response = fetcher
        .execute(&task(&format!("{}/c/shirts", server.uri())))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.text(), "<ul></ul>");
    assert!(response.timing.is_some());
}

#[tokio::test]
async fn test_direct_fetch_honors_disable_redirect() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/new", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
        .mount(&server)
        .await;

    let fetcher = DirectFetcher::new(&user_agent()).unwrap();
    let url = format!("{}/old", server.uri());

    let followed = fetcher.execute(&task(&url)).await.unwrap();
    assert_eq!(followed.status, 200);
    assert_eq!(followed.text(), "moved here");
    // Responses stay keyed by the URL the task targeted
    assert_eq!(followed.url.as_str(), url);

    let mut pinned = task(&url);
    pinned.options.disable_redirect = true;
    let stopped = fetcher.execute(&pinned).await.unwrap();
    assert_eq!(stopped.status, 302);
}

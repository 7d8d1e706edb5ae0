//! Integration tests for `Scraper::scrape_one` / `scrape_many`.
//!
//! Each test mounts its own `wiremock` server and points the storefront
//! rules at the loopback host, so the full pipeline (URL validation →
//! fetch → blocked check → extraction → validation) runs without real
//! network traffic.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use smartstore_core::StorefrontRules;
use smartstore_scraper::{
    ErrorKind, RenderCapture, RenderedCapture, ScrapeOptions, Scraper, ScraperError,
};

fn rules() -> StorefrontRules {
    StorefrontRules::for_host("127.0.0.1")
}

fn fast_options() -> ScrapeOptions {
    ScrapeOptions {
        timeout_secs: 5,
        max_retries: 0,
        base_retry_delay: Duration::ZERO,
        batch_delay: Duration::ZERO,
        establish_session: false,
        ..ScrapeOptions::default()
    }
}

fn test_scraper(opts: ScrapeOptions) -> Scraper {
    Scraper::new(rules(), opts).expect("failed to build test Scraper")
}

/// A product page large enough to pass the blocked-content length check.
fn product_page() -> String {
    format!(
        r#"<html><head>
        <meta property="og:title" content="프리미엄 세라믹 텀블러 500ml : 네이버쇼핑">
        </head><body>
        <div class="prod_buy_header">
          <h3>프리미엄 세라믹 텀블러 500ml</h3>
          <div class="product_price"><del>35,000원</del> <strong>24,900원 특가</strong></div>
        </div>
        <div class="image_gallery"><img src="https://cdn.example.com/main.jpg"></div>
        <!-- {} -->
        </body></html>"#,
        "padding ".repeat(200)
    )
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

// ---------------------------------------------------------------------------
// Test group 1 – scrape_one
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scrape_one_returns_a_validated_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/products/123"))
        .respond_with(html_response(product_page()))
        .expect(1)
        .mount(&server)
        .await;

    let record = test_scraper(fast_options())
        .scrape_one(&format!("{}/acme/products/123", server.uri()))
        .await
        .expect("expected a successful scrape");

    assert_eq!(record.title, "프리미엄 세라믹 텀블러 500ml");
    assert_eq!(record.product_id, "123");
    let price = record.price.unwrap();
    assert_eq!(price.original, Some(35_000.0));
    assert_eq!(price.discounted, Some(24_900.0));
    assert_eq!(record.images, vec!["https://cdn.example.com/main.jpg"]);
}

#[tokio::test]
async fn scrape_one_propagates_fetch_classification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/products/404"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_scraper(fast_options())
        .scrape_one(&format!("{}/acme/products/404", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::NotFound { .. }));
}

#[tokio::test]
async fn scrape_one_rejects_malformed_urls_before_fetching() {
    let server = MockServer::start().await;

    let err = test_scraper(fast_options())
        .scrape_one(&format!("{}/acme/not-a-product", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::InvalidInput { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn scrape_one_proceeds_past_a_blocked_looking_body() {
    // Short body with a plausible title: the blocked heuristic fires but
    // must not abort the scrape.
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/products/9"))
        .respond_with(html_response(
            "<div class=\"prod_buy_header\"><h3>미니 보온병 300ml</h3></div>".to_owned(),
        ))
        .mount(&server)
        .await;

    let record = test_scraper(fast_options())
        .scrape_one(&format!("{}/acme/products/9", server.uri()))
        .await
        .unwrap();
    assert_eq!(record.title, "미니 보온병 300ml");
    assert!(record.images.is_empty());
}

#[tokio::test]
async fn scrape_one_missing_title_is_field_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/products/7"))
        .respond_with(html_response(
            "<html><body><p>nothing to see</p></body></html>".to_owned(),
        ))
        .mount(&server)
        .await;

    let err = test_scraper(fast_options())
        .scrape_one(&format!("{}/acme/products/7", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScraperError::FieldMissing { field: "title", .. }
    ));
}

#[tokio::test]
async fn scrape_one_warms_the_session_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme"))
        .respond_with(html_response("<html>store root</html>".to_owned()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acme/products/123"))
        .respond_with(html_response(product_page()))
        .expect(1)
        .mount(&server)
        .await;

    let opts = ScrapeOptions {
        establish_session: true,
        ..fast_options()
    };
    test_scraper(opts)
        .scrape_one(&format!("{}/acme/products/123", server.uri()))
        .await
        .unwrap();
}

#[tokio::test]
async fn scrape_one_swallows_session_warm_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acme/products/123"))
        .respond_with(html_response(product_page()))
        .mount(&server)
        .await;

    let opts = ScrapeOptions {
        establish_session: true,
        ..fast_options()
    };
    let record = test_scraper(opts)
        .scrape_one(&format!("{}/acme/products/123", server.uri()))
        .await
        .expect("warm-up failure must never propagate");
    assert_eq!(record.product_id, "123");
}

// ---------------------------------------------------------------------------
// Test group 2 – render fallback
// ---------------------------------------------------------------------------

struct StubRender;

impl RenderCapture for StubRender {
    fn render_and_capture<'a>(
        &'a self,
        _url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<RenderedCapture, ScraperError>> + Send + 'a>> {
        Box::pin(async {
            Ok(RenderedCapture {
                product_json: json!({
                    "name": "스크립트 렌더링 상품",
                    "salePrice": 19000.0,
                    "images": ["https://cdn.example.com/rendered.jpg"],
                }),
                benefits_json: json!({}),
            })
        })
    }
}

#[tokio::test]
async fn render_fallback_rescues_an_empty_shell_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/products/55"))
        .respond_with(html_response(
            "<html><body><div id=\"app\"></div></body></html>".to_owned(),
        ))
        .mount(&server)
        .await;

    let record = test_scraper(fast_options())
        .with_render_fallback(Box::new(StubRender))
        .scrape_one(&format!("{}/acme/products/55", server.uri()))
        .await
        .expect("render fallback should rescue the scrape");

    assert_eq!(record.title, "스크립트 렌더링 상품");
    assert_eq!(record.price.unwrap().original, Some(19_000.0));
    assert_eq!(record.images, vec!["https://cdn.example.com/rendered.jpg"]);
}

// ---------------------------------------------------------------------------
// Test group 3 – scrape_many
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_partitions_successes_and_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/products/1"))
        .respond_with(html_response(product_page()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acme/products/2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acme/products/3"))
        .respond_with(html_response(product_page()))
        .mount(&server)
        .await;

    let urls: Vec<String> = [1, 2, 3]
        .iter()
        .map(|id| format!("{}/acme/products/{id}", server.uri()))
        .collect();
    let outcome = test_scraper(fast_options()).scrape_many(&urls).await;

    assert_eq!(outcome.succeeded.len(), 2);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].kind, ErrorKind::NotFound);
    assert!(outcome.failed[0].url.ends_with("/acme/products/2"));
}

#[tokio::test]
async fn batch_continues_after_every_kind_of_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/products/2"))
        .respond_with(html_response(product_page()))
        .mount(&server)
        .await;

    let urls = vec![
        "not a url".to_owned(),
        format!("{}/acme/products/2", server.uri()),
    ];
    let outcome = test_scraper(fast_options()).scrape_many(&urls).await;

    assert_eq!(outcome.succeeded.len(), 1);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].kind, ErrorKind::InvalidInput);
}

#[tokio::test]
async fn rate_limit_escalates_the_batch_delay_monotonically() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/products/1"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acme/products/2"))
        .respond_with(html_response(product_page()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/acme/products/3"))
        .respond_with(html_response(product_page()))
        .mount(&server)
        .await;

    let opts = ScrapeOptions {
        batch_delay: Duration::from_millis(50),
        ..fast_options()
    };
    let urls: Vec<String> = [1, 2, 3]
        .iter()
        .map(|id| format!("{}/acme/products/{id}", server.uri()))
        .collect();

    let started = Instant::now();
    let outcome = test_scraper(opts).scrape_many(&urls).await;
    let elapsed = started.elapsed();

    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].kind, ErrorKind::RateLimited);
    assert_eq!(outcome.succeeded.len(), 2);
    // Item 1 fails rate-limited → the 50ms delay doubles to 100ms before
    // items 2 and 3. Unescalated, total sleep would be 100ms; escalated it
    // is at least 200ms.
    assert!(
        elapsed >= Duration::from_millis(200),
        "expected escalated delays, batch finished in {elapsed:?}"
    );
}

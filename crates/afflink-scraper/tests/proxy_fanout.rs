//! Integration tests for `ProxyFanout::fetch` against `wiremock` proxies.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use afflink_scraper::{ProxyFanout, ScraperError};

const TARGET: &str = "https://www.amazon.es/dp/B08XYZ1234";

fn product_page() -> String {
    format!(
        "<html><head><title>Cafetera : Amazon.es</title></head><body>{}</body></html>",
        "<div class=\"feature\">Detalle del producto</div>".repeat(20)
    )
}

fn template(server: &MockServer, route: &str) -> String {
    format!("{}/{route}?target={{url}}", server.uri())
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/{route}")))
        .and(query_param("target", TARGET))
        .respond_with(response)
        .mount(server)
        .await;
}

fn fanout(templates: Vec<String>, timeout: Duration) -> ProxyFanout {
    ProxyFanout::new(templates, timeout, "afflink-test/0.1").expect("failed to build ProxyFanout")
}

#[tokio::test]
async fn returns_page_from_the_one_working_proxy() {
    let server = MockServer::start().await;
    mount(&server, "down", ResponseTemplate::new(502)).await;
    mount(
        &server,
        "captcha",
        ResponseTemplate::new(200).set_body_string(format!(
            "{}<form action=\"/errors/validateCaptcha\"></form>",
            product_page()
        )),
    )
    .await;
    mount(
        &server,
        "tiny",
        ResponseTemplate::new(200).set_body_string("<html></html>"),
    )
    .await;
    mount(
        &server,
        "good",
        ResponseTemplate::new(200).set_body_json(json!({ "contents": product_page() })),
    )
    .await;

    let templates = ["down", "captcha", "tiny", "good"]
        .iter()
        .map(|r| template(&server, r))
        .collect();

    // Order is shuffled per call; every order must land on the good proxy.
    let fanout = fanout(templates, Duration::from_secs(5));
    for _ in 0..5 {
        let html = fanout.fetch(TARGET).await.expect("good proxy should win");
        assert_eq!(html, product_page());
    }
}

#[tokio::test]
async fn all_bad_proxies_fail_after_trying_each_once() {
    let server = MockServer::start().await;
    for route in ["a", "b", "c"] {
        Mock::given(path(format!("/{route}")))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;
    }

    let templates = ["a", "b", "c"].iter().map(|r| template(&server, r)).collect();
    let err = fanout(templates, Duration::from_secs(5))
        .fetch(TARGET)
        .await
        .expect_err("no proxy is usable");

    match err {
        ScraperError::AllProxiesFailed { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(last.contains("HTTP 403"), "unexpected last error: {last}");
        }
        other => panic!("expected AllProxiesFailed, got: {other:?}"),
    }
}

#[tokio::test]
async fn slow_proxy_is_abandoned_after_attempt_timeout() {
    let server = MockServer::start().await;
    mount(
        &server,
        "slow",
        ResponseTemplate::new(200)
            .set_body_string(product_page())
            .set_delay(Duration::from_secs(5)),
    )
    .await;

    let err = fanout(vec![template(&server, "slow")], Duration::from_millis(300))
        .fetch(TARGET)
        .await
        .expect_err("slow proxy should time out");

    assert!(
        matches!(&err, ScraperError::AllProxiesFailed { attempts: 1, last } if last.contains("timed out")),
        "expected timeout failure, got: {err:?}"
    );
}

#[tokio::test]
async fn template_without_placeholder_gets_target_appended() {
    let server = MockServer::start().await;
    Mock::given(path("/raw"))
        .and(query_param("url", TARGET))
        .respond_with(ResponseTemplate::new(200).set_body_string(product_page()))
        .expect(1)
        .mount(&server)
        .await;

    let html = fanout(
        vec![format!("{}/raw?url=", server.uri())],
        Duration::from_secs(5),
    )
    .fetch(TARGET)
    .await
    .expect("appended target should reach the proxy");

    assert_eq!(html, product_page());
}

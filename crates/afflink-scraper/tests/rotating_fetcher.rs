//! Integration tests for `RotatingFetcher::fetch`.
//!
//! Each test stands up a `wiremock` server acting as the scraping service.
//! Credentials are told apart by the `api_key` query parameter, and
//! `.expect(n)` pins the exact number of calls each credential receives.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use afflink_scraper::{
    CredentialPool, NetworkErrorPolicy, RotatingFetcher, RotationState, ScraperError,
    UpstreamEndpoint,
};

const TARGET: &str = "https://www.amazon.es/dp/B08XYZ1234";
const PAGE: &str = "<html><head><title>Producto</title></head><body>ok</body></html>";

fn fetcher(server: &MockServer, policy: NetworkErrorPolicy) -> RotatingFetcher {
    let endpoint = UpstreamEndpoint::new(&format!("{}/", server.uri()), "api_key", "url")
        .expect("valid test endpoint");
    RotatingFetcher::new(endpoint, 1, "afflink-test/0.1", policy)
        .expect("failed to build test RotatingFetcher")
}

fn pool(keys: &[&str]) -> CredentialPool {
    CredentialPool::new(keys.iter().copied()).expect("non-empty test pool")
}

async fn mount(server: &MockServer, key: &str, response: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("api_key", key))
        .and(query_param("url", TARGET))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

fn quota() -> ResponseTemplate {
    ResponseTemplate::new(429).set_body_string("Too many requests")
}

fn page() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(PAGE)
}

// ---------------------------------------------------------------------------
// Success after rotation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn nth_credential_success_takes_exactly_n_calls() {
    let server = MockServer::start().await;
    mount(&server, "key-a", quota(), 1).await;
    mount(
        &server,
        "key-b",
        ResponseTemplate::new(403).set_body_string("Forbidden"),
        1,
    )
    .await;
    mount(&server, "key-c", page(), 1).await;
    mount(&server, "key-d", page(), 0).await;

    let state = RotationState::default();
    let html = fetcher(&server, NetworkErrorPolicy::Abort)
        .fetch(TARGET, &pool(&["key-a", "key-b", "key-c", "key-d"]), &state)
        .await
        .expect("third credential should succeed");

    assert_eq!(html, PAGE);
    assert_eq!(state.cursor(), 2, "cursor must point at the credential that worked");
}

#[tokio::test]
async fn rotation_starts_at_cursor_and_wraps() {
    // [A, B, C] with cursor 1: B is rate-limited, C succeeds, A is never tried.
    let server = MockServer::start().await;
    mount(&server, "key-a", page(), 0).await;
    mount(&server, "key-b", quota(), 1).await;
    mount(&server, "key-c", page(), 1).await;

    let state = RotationState::new(1);
    let result = fetcher(&server, NetworkErrorPolicy::Abort)
        .fetch(TARGET, &pool(&["key-a", "key-b", "key-c"]), &state)
        .await;

    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    assert_eq!(state.cursor(), 2);
}

#[tokio::test]
async fn wraps_around_to_earlier_credentials() {
    let server = MockServer::start().await;
    mount(&server, "key-a", page(), 1).await;
    mount(&server, "key-b", page(), 0).await;
    mount(&server, "key-c", quota(), 1).await;

    let state = RotationState::new(2);
    fetcher(&server, NetworkErrorPolicy::Abort)
        .fetch(TARGET, &pool(&["key-a", "key-b", "key-c"]), &state)
        .await
        .expect("wrapped credential should succeed");

    assert_eq!(state.cursor(), 0);
}

#[tokio::test]
async fn cursor_converges_on_working_credential_from_any_start() {
    let server = MockServer::start().await;
    Mock::given(query_param("api_key", "key-a"))
        .respond_with(quota())
        .mount(&server)
        .await;
    Mock::given(query_param("api_key", "key-b"))
        .respond_with(page())
        .mount(&server)
        .await;
    Mock::given(query_param("api_key", "key-c"))
        .respond_with(ResponseTemplate::new(402).set_body_string("No credits remaining"))
        .mount(&server)
        .await;

    let fetcher = fetcher(&server, NetworkErrorPolicy::Abort);
    let pool = pool(&["key-a", "key-b", "key-c"]);

    for start in [0, 1, 2, 7] {
        let state = RotationState::new(start);
        fetcher
            .fetch(TARGET, &pool, &state)
            .await
            .unwrap_or_else(|e| panic!("start {start}: {e}"));
        assert_eq!(state.cursor(), 1, "start {start} should converge on key-b");
    }
}

#[tokio::test]
async fn out_of_range_cursor_restarts_at_first_credential() {
    let server = MockServer::start().await;
    mount(&server, "key-a", page(), 1).await;
    mount(&server, "key-b", page(), 0).await;

    let state = RotationState::new(9);
    fetcher(&server, NetworkErrorPolicy::Abort)
        .fetch(TARGET, &pool(&["key-a", "key-b"]), &state)
        .await
        .expect("first credential should succeed");

    assert_eq!(state.cursor(), 0);
}

// ---------------------------------------------------------------------------
// Exhaustion and hard failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn all_quota_failures_exhaust_pool_in_len_calls() {
    let server = MockServer::start().await;
    mount(&server, "key-a", quota(), 1).await;
    mount(
        &server,
        "key-b",
        ResponseTemplate::new(401).set_body_string("Invalid API key"),
        1,
    )
    .await;
    mount(
        &server,
        "key-c",
        ResponseTemplate::new(500).set_body_string("Monthly quota exceeded"),
        1,
    )
    .await;

    let state = RotationState::new(0);
    let err = fetcher(&server, NetworkErrorPolicy::Abort)
        .fetch(TARGET, &pool(&["key-a", "key-b", "key-c"]), &state)
        .await
        .expect_err("every credential is rejected");

    match err {
        ScraperError::AllCredentialsExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(
                matches!(
                    *last,
                    ScraperError::QuotaOrAuth {
                        credential_index: 2,
                        status: Some(500),
                        ..
                    }
                ),
                "expected the last rejection, got: {last:?}"
            );
        }
        other => panic!("expected AllCredentialsExhausted, got: {other:?}"),
    }
    assert_eq!(state.cursor(), 0, "cursor is untouched without a success");
}

#[tokio::test]
async fn hard_failure_on_first_credential_aborts_after_one_call() {
    let server = MockServer::start().await;
    mount(
        &server,
        "key-a",
        ResponseTemplate::new(500).set_body_string("Internal Server Error"),
        1,
    )
    .await;
    mount(&server, "key-b", page(), 0).await;

    let state = RotationState::default();
    let err = fetcher(&server, NetworkErrorPolicy::Abort)
        .fetch(TARGET, &pool(&["key-a", "key-b"]), &state)
        .await
        .expect_err("hard failure must not rotate");

    assert!(
        matches!(
            err,
            ScraperError::UpstreamHard {
                credential_index: 0,
                status: Some(500),
                ..
            }
        ),
        "expected UpstreamHard, got: {err:?}"
    );
    assert_eq!(state.cursor(), 0, "cursor moves only on success");
}

#[tokio::test]
async fn hard_failure_after_rotation_leaves_cursor_alone() {
    let server = MockServer::start().await;
    mount(&server, "key-a", quota(), 1).await;
    mount(
        &server,
        "key-b",
        ResponseTemplate::new(502).set_body_string("Bad Gateway"),
        1,
    )
    .await;
    mount(&server, "key-c", page(), 0).await;

    let state = RotationState::new(0);
    let err = fetcher(&server, NetworkErrorPolicy::Abort)
        .fetch(TARGET, &pool(&["key-a", "key-b", "key-c"]), &state)
        .await
        .expect_err("hard failure on the second credential aborts");

    assert!(
        matches!(
            err,
            ScraperError::UpstreamHard {
                credential_index: 1,
                ..
            }
        ),
        "expected UpstreamHard, got: {err:?}"
    );
    assert_eq!(state.cursor(), 0);
}

#[tokio::test]
async fn empty_success_body_is_a_hard_failure() {
    let server = MockServer::start().await;
    mount(&server, "key-a", ResponseTemplate::new(200), 1).await;
    mount(&server, "key-b", page(), 0).await;

    let err = fetcher(&server, NetworkErrorPolicy::Abort)
        .fetch(TARGET, &pool(&["key-a", "key-b"]), &RotationState::default())
        .await
        .expect_err("empty body is not a page");

    assert!(matches!(err, ScraperError::UpstreamHard { status: Some(200), .. }));
}

// ---------------------------------------------------------------------------
// Response decoding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn json_envelope_is_unwrapped() {
    let server = MockServer::start().await;
    mount(
        &server,
        "key-a",
        ResponseTemplate::new(200).set_body_json(json!({ "contents": PAGE, "status": 200 })),
        1,
    )
    .await;

    let html = fetcher(&server, NetworkErrorPolicy::Abort)
        .fetch(TARGET, &pool(&["key-a"]), &RotationState::default())
        .await
        .expect("envelope should decode");

    assert_eq!(html, PAGE);
}

// ---------------------------------------------------------------------------
// Network-level failures
// ---------------------------------------------------------------------------

fn stalled() -> ResponseTemplate {
    page().set_delay(Duration::from_secs(3))
}

#[tokio::test]
async fn network_failure_aborts_by_default() {
    let server = MockServer::start().await;
    mount(&server, "key-a", stalled(), 1).await;
    mount(&server, "key-b", page(), 0).await;

    let err = fetcher(&server, NetworkErrorPolicy::Abort)
        .fetch(TARGET, &pool(&["key-a", "key-b"]), &RotationState::default())
        .await
        .expect_err("timeout should abort");

    assert!(
        matches!(err, ScraperError::UpstreamHard { status: None, .. }),
        "expected UpstreamHard without status, got: {err:?}"
    );
}

#[tokio::test]
async fn network_failure_rotates_when_configured() {
    let server = MockServer::start().await;
    mount(&server, "key-a", stalled(), 1).await;
    mount(&server, "key-b", page(), 1).await;

    let state = RotationState::default();
    fetcher(&server, NetworkErrorPolicy::Rotate)
        .fetch(TARGET, &pool(&["key-a", "key-b"]), &state)
        .await
        .expect("second credential should succeed");

    assert_eq!(state.cursor(), 1);
}

#[tokio::test]
async fn network_failure_detail_never_contains_the_credential() {
    const SECRET: &str = "SECRET-KEY-123";

    for policy in [NetworkErrorPolicy::Abort, NetworkErrorPolicy::Rotate] {
        let server = MockServer::start().await;
        mount(&server, SECRET, stalled(), 1).await;

        let err = fetcher(&server, policy)
            .fetch(TARGET, &pool(&[SECRET]), &RotationState::default())
            .await
            .expect_err("stalled upstream should fail");

        match (&err, policy) {
            (ScraperError::UpstreamHard { .. }, NetworkErrorPolicy::Abort)
            | (ScraperError::AllCredentialsExhausted { .. }, NetworkErrorPolicy::Rotate) => {}
            _ => panic!("unexpected error for {policy:?}: {err:?}"),
        }
        let rendered = format!("{err} {err:?}");
        assert!(!rendered.contains(SECRET), "credential leaked: {rendered}");
        assert!(!rendered.contains("api_key="), "request URL leaked: {rendered}");
    }
}

#[tokio::test]
async fn rejection_body_echoing_the_credential_is_redacted() {
    const SECRET: &str = "SECRET-KEY-456";

    let server = MockServer::start().await;
    mount(
        &server,
        SECRET,
        ResponseTemplate::new(401).set_body_string(format!("Invalid API key: {SECRET}")),
        1,
    )
    .await;

    let err = fetcher(&server, NetworkErrorPolicy::Abort)
        .fetch(TARGET, &pool(&[SECRET]), &RotationState::default())
        .await
        .expect_err("the only credential is rejected");

    let rendered = err.to_string();
    assert!(!rendered.contains(SECRET), "credential leaked: {rendered}");
    assert!(rendered.contains("Invalid API key"), "detail kept: {rendered}");
}

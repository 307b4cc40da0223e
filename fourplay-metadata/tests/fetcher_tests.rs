//! HttpFetcher retry behavior against a wiremock server

use fourplay_metadata::fetcher::{Backoff, HttpFetcher, JsonFetcher, RetryPolicy};
use reqwest::Url;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        attempt_timeout: Duration::from_millis(200),
        retry_delay: Duration::from_millis(10),
        backoff: Backoff::Fixed,
    }
}

fn url(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
}

#[tokio::test]
async fn test_successful_fetch_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(fast_policy()).unwrap();
    let body = fetcher.fetch_json(&url(&server, "/ok"), &[]).await;

    assert_eq!(body, Some(json!({"value": 7})));
}

#[tokio::test]
async fn test_retries_after_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(fast_policy()).unwrap();
    let body = fetcher.fetch_json(&url(&server, "/flaky"), &[]).await;

    assert_eq!(body, Some(json!({"ok": true})));
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(fast_policy()).unwrap();
    assert!(fetcher.fetch_json(&url(&server, "/down"), &[]).await.is_none());
}

#[tokio::test]
async fn test_non_ok_success_status_counts_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/accepted"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"queued": true})))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(fast_policy()).unwrap();
    assert!(fetcher.fetch_json(&url(&server, "/accepted"), &[]).await.is_none());
}

#[tokio::test]
async fn test_attempt_timeout_counts_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"late": true}))
                .set_delay(Duration::from_millis(800)),
        )
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(fast_policy()).unwrap();
    assert!(fetcher.fetch_json(&url(&server, "/slow"), &[]).await.is_none());
}

#[tokio::test]
async fn test_undecodable_body_counts_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(fast_policy()).unwrap();
    assert!(fetcher.fetch_json(&url(&server, "/html"), &[]).await.is_none());
}

#[tokio::test]
async fn test_single_attempt_policy_does_not_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/once"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let policy = RetryPolicy {
        max_attempts: 1,
        ..fast_policy()
    };
    let fetcher = HttpFetcher::new(policy).unwrap();
    assert!(fetcher.fetch_json(&url(&server, "/once"), &[]).await.is_none());
}

#[tokio::test]
async fn test_connection_refused_returns_none() {
    let fetcher = HttpFetcher::new(fast_policy()).unwrap();
    let unreachable = Url::parse("http://127.0.0.1:1/nothing").unwrap();

    assert!(fetcher.fetch_json(&unreachable, &[]).await.is_none());
}

#[tokio::test]
async fn test_request_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ua"))
        .and(header("user-agent", "FOURplay-Microservice/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(fast_policy()).unwrap();
    let headers = [("User-Agent", "FOURplay-Microservice/1.0".to_string())];
    let body = fetcher.fetch_json(&url(&server, "/ua"), &headers).await;

    assert_eq!(body, Some(json!([])));
}

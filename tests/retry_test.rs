//! Integration tests for retried HTTP fetches.

mod common;

use assert_matches::assert_matches;
use serde_json::json;
use serial_test::serial;
use streamflix::anime::AnimeClient;
use streamflix::http::{
    build_client, fetch_json, retry_config, set_retry_config, update_retry_config, FetchError,
    FetchOptions, RetryConfig,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::fast_retry;

async fn fetch(server: &MockServer, config: &RetryConfig) -> Result<serde_json::Value, FetchError> {
    let client = build_client(std::time::Duration::from_secs(5));
    let url = format!("{}/meta", server.uri());
    fetch_json(&client, &url, &FetchOptions::default(), config, &CancellationToken::new()).await
}

#[tokio::test]
async fn transient_status_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/meta"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/meta"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let body = fetch(&server, &fast_retry(1)).await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn not_found_is_returned_immediately() {
    let server = MockServer::start().await;
    Mock::given(path("/meta"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetch(&server, &fast_retry(3)).await.unwrap_err();
    assert_matches!(err, FetchError::Status { status: 404, .. });
}

#[tokio::test]
async fn retries_stop_after_limit() {
    let server = MockServer::start().await;
    Mock::given(path("/meta"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let err = fetch(&server, &fast_retry(2)).await.unwrap_err();
    assert_eq!(err.status_code(), Some(500));
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(path("/meta"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = fetch(&server, &RetryConfig::no_retry()).await.unwrap_err();
    assert_matches!(err, FetchError::Decode(_));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(path("/meta"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(std::time::Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = build_client(std::time::Duration::from_secs(5));
    let url = format!("{}/meta", server.uri());
    let options = FetchOptions::default().with_timeout(std::time::Duration::from_millis(100));
    let err = fetch_json(
        &client,
        &url,
        &options,
        &RetryConfig::no_retry(),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert_matches!(err, FetchError::Timeout(_));
}

// ---------------------------------------------------------------------------
// Process-wide policy
// ---------------------------------------------------------------------------

#[tokio::test]
#[serial]
async fn clients_follow_process_wide_policy() {
    let server = MockServer::start().await;
    Mock::given(path("/meta"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    set_retry_config(fast_retry(2));
    let client = AnimeClient::new(server.uri());
    let err = client.meta().await.unwrap_err();
    set_retry_config(RetryConfig::default());

    assert_eq!(err.status_code(), Some(502));
}

#[test]
#[serial]
fn policy_updates_are_visible() {
    set_retry_config(RetryConfig::default());
    update_retry_config(|c| c.max_retries = 4);
    assert_eq!(retry_config().max_retries, 4);
    set_retry_config(RetryConfig::default());
    assert_eq!(retry_config(), RetryConfig::default());
}

//! End-to-end tests for RetryTransport over reqwest
//!
//! Tests cover:
//! - GET and POST with and without retries
//! - Retry exhaustion against a server that always fails
//! - Non-retryable statuses
//! - Request body replay on POST retries
//! - Connection failures against a closed port
//! - Cancellation during the backoff wait

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use httpr::retry::StatsObserver;
use httpr::{Error, Request, RetryPolicy, RetryTransport, TransportError};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

#[derive(Debug, Deserialize)]
struct Message {
    message: String,
}

fn transport(policy: RetryPolicy) -> RetryTransport {
    init_tracing();
    RetryTransport::builder().retry_policy(policy).build()
}

#[tokio::test]
async fn test_get_without_retry() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mock_json(&server, "/hello", r#"{"message":"hello"}"#).await;

    let response = transport(fast_policy(3))
        .perform(Request::get(&format!("{}/hello", server.uri()))?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body: Message = response.json().await?;
    assert_eq!(body.message, "hello");
    Ok(())
}

#[tokio::test]
async fn test_get_recovers_after_failures() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mock_flaky(&server, "GET", "/flaky", 503, 2, r#"{"message":"hello"}"#).await;

    let stats = Arc::new(StatsObserver::new());
    let transport = RetryTransport::builder()
        .retry_policy(fast_policy(3))
        .observer(stats.clone())
        .build();

    let response = transport
        .perform(Request::get(&format!("{}/flaky", server.uri()))?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, r#"{"message":"hello"}"#);
    assert_eq!(stats.attempt_starts(), 3);
    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_always_500_returns_last_response() {
    let server = MockServer::start().await;
    mock_always(&server, "/broken", 500, 4).await;

    let response = transport(fast_policy(3))
        .perform(Request::get(&format!("{}/broken", server.uri())).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text().await.unwrap(), "status 500");
    server.verify().await;
}

#[tokio::test]
async fn test_404_is_not_retried() {
    let server = MockServer::start().await;
    mock_always(&server, "/missing", 404, 1).await;

    let response = transport(fast_policy(3))
        .perform(Request::get(&format!("{}/missing", server.uri())).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    server.verify().await;
}

#[tokio::test]
async fn test_no_retry_sends_once() {
    let server = MockServer::start().await;
    mock_always(&server, "/busy", 503, 1).await;

    let transport = RetryTransport::builder().no_retry().build();
    let response = transport
        .perform(Request::get(&format!("{}/busy", server.uri())).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    server.verify().await;
}

#[tokio::test]
async fn test_post_without_retry() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mock_flaky_echo(&server, "/echo", 0).await;

    let request =
        Request::post(&format!("{}/echo", server.uri()))?.with_body(r#"{"message":"post"}"#);
    let response = transport(fast_policy(3)).perform(request).await?;

    let body: Message = response.json().await?;
    assert_eq!(body.message, "post");
    Ok(())
}

#[tokio::test]
async fn test_post_body_replayed_on_retry() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mock_flaky_echo(&server, "/echo", 2).await;

    let request =
        Request::post(&format!("{}/echo", server.uri()))?.with_body(r#"{"message":"post"}"#);
    let response = transport(fast_policy(3)).perform(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, r#"{"message":"post"}"#);

    // Every attempt carried the full body
    let received = server.received_requests().await.unwrap_or_default();
    assert_eq!(received.len(), 3);
    for request in received {
        assert_eq!(request.body, br#"{"message":"post"}"#.to_vec());
    }
    Ok(())
}

#[tokio::test]
async fn test_connection_refused_exhausts_retries() {
    let stats = Arc::new(StatsObserver::new());
    let transport = RetryTransport::builder()
        .retry_policy(fast_policy(2))
        .observer(stats.clone())
        .build();

    let err = transport
        .perform(Request::get(&closed_port_url()).unwrap())
        .await
        .unwrap_err();

    assert!(err.is_transport());
    assert!(err.as_transport().is_some_and(TransportError::is_connect));
    assert_eq!(stats.attempt_starts(), 3);
    assert_eq!(stats.exhaustions(), 1);
}

#[tokio::test]
async fn test_cancellation_during_backoff() {
    let server = MockServer::start().await;
    mock_always(&server, "/slow-recovery", 503, 1).await;

    let transport = transport(
        RetryPolicy::standard()
            .with_delays(Duration::from_secs(30), Duration::from_secs(60))
            .with_jitter(0.0),
    );
    let token = CancellationToken::new();
    let request = Request::get(&format!("{}/slow-recovery", server.uri()))
        .unwrap()
        .with_cancellation(token.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let started = std::time::Instant::now();
    let err = transport.perform(request).await.unwrap_err();

    assert!(matches!(err, Error::Cancelled { attempts: 1 }));
    assert!(started.elapsed() < Duration::from_secs(10));
    server.verify().await;
}

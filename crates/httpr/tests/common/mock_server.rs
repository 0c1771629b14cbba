//! Mock server helpers for retry testing
//!
//! Provides wiremock endpoints that fail a set number of times, always
//! fail, or echo the request body back.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Responds 200 with the request's own body
pub struct EchoBody;

impl Respond for EchoBody {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_bytes(request.body.clone())
    }
}

/// Set up a JSON endpoint that always succeeds
pub async fn mock_json(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_raw(body, "application/json"),
        )
        .mount(server)
        .await;
}

/// Set up an endpoint that fails `fail_count` times before succeeding
///
/// First `fail_count` requests return `fail_status`, subsequent requests
/// return 200 with `body`.
pub async fn mock_flaky(
    server: &MockServer,
    http_method: &str,
    route: &str,
    fail_status: u16,
    fail_count: u64,
    body: &str,
) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(fail_status).set_body_string("try again"))
        .up_to_n_times(fail_count)
        .mount(server)
        .await;

    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Set up an endpoint that always returns `status`, expecting exactly
/// `expected_calls` requests
pub async fn mock_always(server: &MockServer, route: &str, status: u16, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(format!("status {}", status)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Set up a POST endpoint that fails `fail_count` times, then echoes the body
pub async fn mock_flaky_echo(server: &MockServer, route: &str, fail_count: u64) {
    if fail_count > 0 {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(fail_count)
            .mount(server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(EchoBody)
        .mount(server)
        .await;
}

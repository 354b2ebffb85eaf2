//! Tests for the HTTP client module

use super::*;
use crate::auth::AuthConfig;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn mock_config(server: &MockServer) -> ClientConfigBuilder {
    ClientConfig::builder(server.uri())
        .insecure_http()
        .min_interval(Duration::from_millis(1))
}

fn datadog_auth() -> AuthConfig {
    AuthConfig::DatadogKeys {
        api_key: "api-123".to_string(),
        app_key: "app-456".to_string(),
    }
}

// ============================================================================
// URL handling
// ============================================================================

#[test]
fn test_join_url_slash_combinations() {
    assert_eq!(join_url("https://host/", "/a/b"), "https://host/a/b");
    assert_eq!(join_url("https://host", "a/b"), "https://host/a/b");
    assert_eq!(join_url("https://host/", "a/b"), "https://host/a/b");
    assert_eq!(join_url("https://host", "/a/b"), "https://host/a/b");
    assert_eq!(join_url("https://host//", "//a/b"), "https://host/a/b");
}

#[test]
fn test_normalize_base_url() {
    assert_eq!(
        normalize_base_url("http://host", Scheme::Https),
        "https://host"
    );
    assert_eq!(
        normalize_base_url("https://host", Scheme::Https),
        "https://host"
    );
    assert_eq!(
        normalize_base_url("api.datadoghq.com", Scheme::Https),
        "https://api.datadoghq.com"
    );
    assert_eq!(
        normalize_base_url("HTTP://Host/api", Scheme::Https),
        "https://Host/api"
    );
    assert_eq!(
        normalize_base_url("https://127.0.0.1:8080", Scheme::Http),
        "http://127.0.0.1:8080"
    );
}

#[test]
fn test_client_normalizes_scheme_before_requests() {
    let client = HttpClient::new(ClientConfig::builder("http://host").build()).unwrap();

    assert_eq!(client.base_url(), "https://host");
    assert_eq!(client.url("/api/v2/logs"), "https://host/api/v2/logs");
}

#[test]
fn test_client_config_defaults() {
    let config = ClientConfig::builder("api.datadoghq.com").build();

    assert_eq!(config.timeout, Duration::from_secs(300));
    assert_eq!(config.min_interval, Duration::from_millis(10));
    assert_eq!(config.scheme, Scheme::Https);
    assert!(matches!(config.auth, AuthConfig::None));
    assert!(config.user_agent.starts_with("singer-taps/"));
}

#[test]
fn test_client_rejects_invalid_base_url() {
    let result = HttpClient::new(ClientConfig::builder("http://").build());
    assert!(result.is_err());
}

// ============================================================================
// Success path
// ============================================================================

#[tokio::test]
async fn test_status_200_returns_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("xtm-page", "1")
                .set_body_json(json!([{"id": 1, "name": "Alpha"}])),
        )
        .mount(&server)
        .await;

    let client = HttpClient::new(mock_config(&server).build()).unwrap();
    let response = client.execute(&ApiRequest::get("/projects")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body[0]["name"], "Alpha");
    assert_eq!(response.header_str("xtm-page"), Some("1"));
}

#[tokio::test]
async fn test_post_sends_json_body_and_query() {
    let server = MockServer::start().await;
    let payload = json!({"filter": {"query": "*"}, "page": {"limit": 10}});

    Mock::given(method("POST"))
        .and(path("/api/v2/logs/events/search"))
        .and(query_param("trace", "1"))
        .and(body_json(payload.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(mock_config(&server).build()).unwrap();
    let request = ApiRequest::post("api/v2/logs/events/search")
        .query("trace", "1")
        .json(payload);

    let response = client.execute(&request).await.unwrap();
    assert_eq!(response.body, json!({"data": []}));
}

#[tokio::test]
async fn test_fixed_headers_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/validate"))
        .and(header("DD-API-KEY", "api-123"))
        .and(header("DD-APPLICATION-KEY", "app-456"))
        .and(header("Content-Type", "application/json"))
        .and(header("Accept", "application/json"))
        .and(header("X-Request-Id", "req-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(mock_config(&server).auth(datadog_auth()).build()).unwrap();
    let request = ApiRequest::get("/api/v1/validate").header("X-Request-Id", "req-1");

    client.execute(&request).await.unwrap();
}

#[tokio::test]
async fn test_fixed_headers_override_caller_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/validate"))
        .and(header("Accept", "application/json"))
        .and(header("DD-API-KEY", "api-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(mock_config(&server).auth(datadog_auth()).build()).unwrap();
    let request = ApiRequest::get("/api/v1/validate")
        .header("Accept", "text/html")
        .header("DD-API-KEY", "forged");

    client.execute(&request).await.unwrap();
}

#[tokio::test]
async fn test_invalid_caller_header_is_rejected() {
    let server = MockServer::start().await;
    let client = HttpClient::new(mock_config(&server).build()).unwrap();

    let err = client
        .execute(&ApiRequest::get("/x").header("bad header", "v"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidRequest { .. }));
}

// ============================================================================
// Error classification
// ============================================================================

#[tokio::test]
async fn test_404_is_classified() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/9/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not found"))
        .mount(&server)
        .await;

    let client = HttpClient::new(mock_config(&server).build()).unwrap();
    let err = client
        .execute(&ApiRequest::get("/projects/9/"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    assert_eq!(err.status(), Some(404));
    assert_eq!(
        err.message(),
        "The resource you have specified cannot be found."
    );
    // Plain-text body is not JSON
    assert!(err.body().is_none());
}

#[tokio::test]
async fn test_error_messages_from_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v2/logs/events/search"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorMessages": ["invalid query syntax"]
        })))
        .mount(&server)
        .await;

    let client = HttpClient::new(mock_config(&server).build()).unwrap();
    let err = client
        .execute(&ApiRequest::post("/api/v2/logs/events/search").json(json!({})))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::BadRequest));
    assert_eq!(err.message(), "invalid query syntax");
    assert_eq!(err.body().unwrap()["errorMessages"][0], "invalid query syntax");
}

#[tokio::test]
async fn test_201_is_treated_as_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .mount(&server)
        .await;

    let client = HttpClient::new(mock_config(&server).build()).unwrap();
    let err = client
        .execute(&ApiRequest::post("/items"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::Unknown));
    assert_eq!(err.message(), "Unknown Error");
}

#[tokio::test]
async fn test_200_with_non_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let client = HttpClient::new(mock_config(&server).build()).unwrap();
    let err = client.execute(&ApiRequest::get("/html")).await.unwrap_err();

    assert!(matches!(err, ApiError::Decode { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_timeout_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = HttpClient::new(
        mock_config(&server)
            .timeout(Duration::from_millis(50))
            .build(),
    )
    .unwrap();
    let err = client.execute(&ApiRequest::get("/slow")).await.unwrap_err();

    assert!(matches!(err, ApiError::Timeout { .. }));
    assert!(err.is_retryable());
}

// ============================================================================
// Request spacing
// ============================================================================

/// Records when each request reached the server
#[derive(Clone, Default)]
struct ArrivalRecorder {
    arrivals: Arc<Mutex<Vec<Instant>>>,
}

impl Respond for ArrivalRecorder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        ResponseTemplate::new(200).set_body_json(json!({"ok": true}))
    }
}

#[tokio::test]
async fn test_consecutive_requests_are_spaced() {
    let server = MockServer::start().await;
    let recorder = ArrivalRecorder::default();
    let interval = Duration::from_millis(40);

    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(recorder.clone())
        .expect(3)
        .mount(&server)
        .await;

    let client = HttpClient::new(mock_config(&server).min_interval(interval).build()).unwrap();

    let start = Instant::now();
    for _ in 0..3 {
        client.execute(&ApiRequest::get("/ping")).await.unwrap();
    }

    let arrivals = recorder.arrivals.lock().unwrap().clone();
    assert_eq!(arrivals.len(), 3);
    // The third request cannot leave before two full intervals have passed
    assert!(arrivals[2].duration_since(start) >= interval * 2 - Duration::from_millis(1));
}

// ============================================================================
// Retry over the real client
// ============================================================================

#[tokio::test]
async fn test_retrying_client_recovers_from_429() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 7}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = Retrying::new(
        HttpClient::new(mock_config(&server).build()).unwrap(),
        RetryPolicy::new().with_backoff(Duration::from_millis(5), Duration::from_millis(20)),
    );

    let response = client.execute(&ApiRequest::get("/projects")).await.unwrap();
    assert_eq!(response.body[0]["id"], 7);
}

#[tokio::test]
async fn test_retrying_client_does_not_retry_401() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = Retrying::new(
        HttpClient::new(mock_config(&server).build()).unwrap(),
        RetryPolicy::new().with_backoff(Duration::from_millis(5), Duration::from_millis(20)),
    );

    let err = client
        .execute(&ApiRequest::get("/projects"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Unauthorized));
    assert_eq!(err.message(), "Invalid authorization credentials.");
}

//! Tests for tap definitions

use super::*;
use crate::auth::AuthConfig;
use crate::http::ApiResponse;
use crate::types::Method;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::json;
use std::time::Duration;

fn datadog_config() -> TapConfig {
    TapConfig::from_json(
        r#"{
            "api_key": "api-123",
            "app_key": "app-456",
            "start_date": "2024-01-01T00:00:00Z",
            "request_timeout": "60"
        }"#,
    )
    .unwrap()
}

fn xtm_config() -> TapConfig {
    TapConfig::from_json(r#"{"api_url": "http://xtm.example.com/rest-api", "api_token": "tok"}"#)
        .unwrap()
}

fn xtm_response(headers: &[(&'static str, &'static str)]) -> ApiResponse {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(*name, HeaderValue::from_static(value));
    }
    ApiResponse {
        status: 200,
        headers: map,
        body: json!([]),
    }
}

fn partition(id: serde_json::Value) -> Partition {
    let mut p = Partition::new();
    p.insert("project_id".to_string(), id);
    p
}

// ============================================================================
// Tap construction
// ============================================================================

#[test]
fn test_tap_kind_parsing() {
    assert_eq!("datadog".parse::<TapKind>().unwrap(), TapKind::Datadog);
    assert_eq!("tap-xtm".parse::<TapKind>().unwrap(), TapKind::Xtm);
    assert_eq!(" XTM ".parse::<TapKind>().unwrap(), TapKind::Xtm);
    assert!(matches!(
        "jira".parse::<TapKind>().unwrap_err(),
        Error::UnknownTap { .. }
    ));
    assert_eq!(TapKind::Datadog.to_string(), "datadog");
}

#[test]
fn test_datadog_tap_defaults() {
    let tap = Tap::new(TapKind::Datadog, &datadog_config()).unwrap();

    assert_eq!(tap.kind(), TapKind::Datadog);
    assert_eq!(tap.stream_names(), vec!["eventlogs"]);
    assert_eq!(tap.client_config().normalized_base_url(), "https://api.datadoghq.com");
    assert_eq!(tap.client_config().timeout, Duration::from_secs(60));
    assert!(matches!(
        tap.client_config().auth,
        AuthConfig::DatadogKeys { .. }
    ));
    assert_eq!(tap.check_request().path, "/api/v1/validate");
}

#[test]
fn test_datadog_requires_keys_and_start_date() {
    let mut config = datadog_config();
    config.app_key = None;
    let err = Tap::new(TapKind::Datadog, &config).unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { ref field } if field == "app_key"));

    let mut config = datadog_config();
    config.start_date = None;
    let err = Tap::new(TapKind::Datadog, &config).unwrap_err();
    assert!(matches!(err, Error::MissingConfigField { ref field } if field == "start_date"));
}

#[test]
fn test_xtm_tap_streams_and_url() {
    let tap = Tap::new(TapKind::Xtm, &xtm_config()).unwrap();

    assert_eq!(
        tap.stream_names(),
        vec!["projects", "projectdetails", "projectstats", "projectmetrics"]
    );
    assert_eq!(
        tap.client_config().normalized_base_url(),
        "https://xtm.example.com/rest-api"
    );
    let children: Vec<_> = tap.children_of("projects").map(TapStream::name).collect();
    assert_eq!(children, vec!["projectdetails", "projectstats", "projectmetrics"]);
    assert!(tap.stream("projectstats").is_some());
    assert!(tap.stream("eventlogs").is_none());
}

#[test]
fn test_xtm_requires_url_and_token() {
    let config = TapConfig::from_json(r#"{"api_token": "tok"}"#).unwrap();
    assert!(matches!(
        Tap::new(TapKind::Xtm, &config).unwrap_err(),
        Error::MissingConfigField { ref field } if field == "base_url"
    ));

    let config = TapConfig::from_json(r#"{"url_base": "xtm.example.com"}"#).unwrap();
    assert!(matches!(
        Tap::new(TapKind::Xtm, &config).unwrap_err(),
        Error::MissingConfigField { ref field } if field == "api_token"
    ));
}

#[test]
fn test_insecure_http_switch() {
    let tap = Tap::new(TapKind::Xtm, &xtm_config()).unwrap().insecure_http();
    assert_eq!(
        tap.client_config().normalized_base_url(),
        "http://xtm.example.com/rest-api"
    );
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_discover_marks_everything_selected() {
    let tap = Tap::new(TapKind::Xtm, &xtm_config()).unwrap();
    let catalog = tap.discover();

    assert_eq!(catalog.streams.len(), 4);
    assert!(catalog.streams.iter().all(|s| s.is_selected()));

    let stats = catalog.get("projectstats").unwrap();
    assert_eq!(stats.key_properties, vec!["project_id", "targetLanguage"]);
    let meta = stats.stream_metadata().unwrap();
    assert_eq!(meta["parent-tap-stream-id"], "projects");
    assert_eq!(meta["forced-replication-method"], "FULL_TABLE");
    assert_eq!(
        stats.field_metadata("project_id").unwrap()["inclusion"],
        "automatic"
    );
    assert_eq!(
        stats.field_metadata("usersStatistics").unwrap()["inclusion"],
        "available"
    );
}

#[test]
fn test_discover_incremental_stream() {
    let tap = Tap::new(TapKind::Datadog, &datadog_config()).unwrap();
    let catalog = tap.discover();
    let entry = catalog.get("eventlogs").unwrap();

    assert_eq!(entry.replication_key.as_deref(), Some("attributes.timestamp"));
    let meta = entry.stream_metadata().unwrap();
    assert_eq!(meta["valid-replication-keys"], json!(["attributes.timestamp"]));
    assert_eq!(meta["forced-replication-method"], "INCREMENTAL");
    // The replication key lives under attributes, so the whole object is kept
    assert_eq!(
        entry.field_metadata("attributes").unwrap()["inclusion"],
        "automatic"
    );
}

// ============================================================================
// Datadog eventlogs
// ============================================================================

#[test]
fn test_eventlogs_first_request_from_start_date() {
    let stream = EventLogs::new("service:api", 25, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    let state = State::new();

    let request = stream.first_request(&StreamContext::new(&state)).unwrap();

    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "/api/v2/logs/events/search");
    assert_eq!(
        request.body.unwrap(),
        json!({
            "filter": {"query": "service:api", "from": "2024-01-01T00:00:00Z", "to": "now"},
            "page": {"limit": 25},
            "sort": "timestamp"
        })
    );
}

#[test]
fn test_eventlogs_first_request_from_bookmark() {
    let stream = EventLogs::new("*", 100, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    let mut state = State::new();
    state
        .set_bookmark(&["eventlogs", "updated"], "2024-06-01T12:00:00.250000Z")
        .unwrap();

    let request = stream.first_request(&StreamContext::new(&state)).unwrap();

    assert_eq!(
        request.body.unwrap()["filter"]["from"],
        "2024-06-01T12:00:00.250Z"
    );
}

#[test]
fn test_eventlogs_cursor_paging() {
    let stream = EventLogs::new("*", 100, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    let state = State::new();
    let first = stream.first_request(&StreamContext::new(&state)).unwrap();

    let page = ApiResponse::from_body(json!({"data": [{}], "meta": {"page": {"after": "abc"}}}));
    let next = stream.next_request(&first, &page).unwrap();
    assert_eq!(next.body.as_ref().unwrap()["page"]["cursor"], "abc");
    assert_eq!(next.body.as_ref().unwrap()["page"]["limit"], 100);

    let last = ApiResponse::from_body(json!({"data": [{}], "meta": {}}));
    assert!(stream.next_request(&next, &last).is_none());
}

// ============================================================================
// XTM streams
// ============================================================================

#[test]
fn test_projects_header_paging() {
    let first = Projects.first_request(&StreamContext::new(&State::new())).unwrap();
    assert!(first.query.is_empty());

    let full = xtm_response(&[
        ("xtm-page", "2"),
        ("xtm-page-size", "50"),
        ("xtm-page-items-count", "50"),
    ]);
    let next = Projects.next_request(&first, &full).unwrap();
    assert_eq!(next.query, vec![("page".to_string(), "3".to_string())]);

    let short = xtm_response(&[
        ("xtm-page", "3"),
        ("xtm-page-size", "50"),
        ("xtm-page-items-count", "12"),
    ]);
    assert!(Projects.next_request(&next, &short).is_none());
}

#[test]
fn test_projects_paging_header_defaults() {
    // No headers: size and count both default to 1000, page to 1
    let next = Projects
        .next_request(&ApiRequest::get("/projects"), &xtm_response(&[]))
        .unwrap();
    assert_eq!(next.query, vec![("page".to_string(), "2".to_string())]);
}

#[test]
fn test_projects_child_partition() {
    assert_eq!(
        Projects.child_partition(&json!({"id": 42, "name": "A"})),
        Some(partition(json!(42)))
    );
    assert_eq!(Projects.child_partition(&json!({"name": "A"})), None);
    assert_eq!(Projects.child_partition(&json!({"id": null})), None);
}

#[test]
fn test_child_paths() {
    let state = State::new();
    let p = partition(json!(42));
    let ctx = StreamContext::new(&state).with_partition(&p);

    assert_eq!(ProjectDetails.first_request(&ctx).unwrap().path, "/projects/42");
    assert_eq!(
        ProjectStats.first_request(&ctx).unwrap().path,
        "/projects/42/statistics"
    );
    assert_eq!(
        ProjectMetrics.first_request(&ctx).unwrap().path,
        "/projects/42/metrics"
    );
}

#[test]
fn test_child_without_partition() {
    let state = State::new();
    let err = ProjectStats
        .first_request(&StreamContext::new(&state))
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Stream 'projectstats' needs 'project_id' from its parent record"
    );
}

#[test]
fn test_child_records_get_project_id() {
    let p = partition(json!(7));
    let record = ProjectMetrics.post_process(json!({"targetLanguage": "de_DE"}), Some(&p));

    assert_eq!(record, json!({"targetLanguage": "de_DE", "project_id": 7}));
}

#[test]
fn test_only_details_skip_not_found() {
    let not_found = ApiError::from_status(404, None);
    let forbidden = ApiError::from_status(403, None);

    assert!(ProjectDetails.is_skippable(&not_found));
    assert!(!ProjectDetails.is_skippable(&forbidden));
    assert!(!ProjectStats.is_skippable(&not_found));
    assert!(!Projects.is_skippable(&not_found));
}

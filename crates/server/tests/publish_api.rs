//! Router tests for the publishing API.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use tokio_test::assert_ok;

use common::{fixtures, standard_publish_body, TestFixture};
use spotsync_core::{
    testing::RecordedPlatformCall, EntityKind, IntegrationConfig, SpotFailurePolicy,
};

const PUBLISH: &str = "/api/v1/integration/publish";

// =============================================================================
// Health, config, metrics
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_config_hides_password() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/config").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["platform"]["username"], "agency");
    assert_eq!(response.body["platform"]["password_configured"], true);
    assert_eq!(response.body["integration"]["max_slots_per_program"], 5);
    assert!(!response.text.contains("secret"));
}

#[tokio::test]
async fn test_metrics_exposition() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/api/v1/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("spotsync_http_requests_total"));
    assert!(response.text.contains("# TYPE"));
}

// =============================================================================
// Publish
// =============================================================================

#[tokio::test]
async fn test_publish_complete() {
    let fixture = TestFixture::new().await;

    let response = fixture.post(PUBLISH, standard_publish_body()).await;
    assert_status!(response, StatusCode::OK);

    let body = &response.body;
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "complete");
    assert_eq!(body["matched_ids"], json!([201]));
    assert_eq!(body["created_ids"].as_array().map(Vec::len), Some(1));
    assert!(body["run_id"].is_string());
    assert!(body.get("error").is_none());
    assert!(body.get("details").is_none());

    assert_eq!(fixture.platform.attach_attempts().await.len(), 1);
    assert_eq!(fixture.connector.connections().len(), 1);
}

#[tokio::test]
async fn test_publish_refused_spot_is_partial() {
    let fixture = TestFixture::new().await;
    fixture.platform.refuse_spots("block is sold out").await;

    let response = fixture.post(PUBLISH, standard_publish_body()).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["status"], "partial");
    assert!(response.body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("block is sold out"));
}

#[tokio::test]
async fn test_publish_fail_policy() {
    let fixture = TestFixture::with_integration(IntegrationConfig {
        spot_failure_policy: SpotFailurePolicy::Fail,
        ..IntegrationConfig::default()
    })
    .await;
    fixture.platform.refuse_spots("block is sold out").await;

    let response = fixture.post(PUBLISH, standard_publish_body()).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["status"], "failed");
}

#[tokio::test]
async fn test_publish_bad_credentials_reports_failure() {
    let fixture = TestFixture::new().await;

    let mut body = standard_publish_body();
    body["connection"] = json!({
        "base_url": "http://mock.platform/api",
        "username": "agency",
        "password": "wrong",
    });

    let response = fixture.post(PUBLISH, body).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["status"], "failed");
    assert!(response.body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("authentication failed"));

    let details = response.body["details"].as_array().cloned().unwrap_or_default();
    let last = details.last().cloned().unwrap_or_default();
    assert_eq!(last["step"], "error");
    assert_eq!(last["progress"], -1);

    // The override was used for this request only
    let connections = fixture.connector.connections();
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].password, "wrong");
}

#[tokio::test]
async fn test_publish_unmatched_brand() {
    let fixture = TestFixture::new().await;

    let mut body = standard_publish_body();
    body["references"] = assert_ok!(serde_json::to_value(
        fixtures::standard_references().with_name(EntityKind::Brand, 10, "Nonexistent Soda"),
    ));

    let response = fixture.post(PUBLISH, body).await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "failed");
    assert!(response.body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("lookup failed for brand 10"));

    let calls = fixture.platform.recorded_calls().await;
    assert!(!calls
        .iter()
        .any(|c| matches!(c, RecordedPlatformCall::BookingGrid { .. })));
    assert!(fixture.platform.attach_attempts().await.is_empty());
}

#[tokio::test]
async fn test_publish_inverted_date_range_is_bad_request() {
    let fixture = TestFixture::new().await;

    let mut body = standard_publish_body();
    body["campaign"]["date_range"] = json!({"start": "2024-03-31", "end": "2024-03-01"});

    let response = fixture.post(PUBLISH, body).await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
    assert!(fixture.connector.connections().is_empty());
    assert!(fixture.platform.recorded_calls().await.is_empty());
}

#[tokio::test]
async fn test_publish_unreachable_platform_is_bad_gateway() {
    let fixture = TestFixture::new().await;
    fixture.connector.refuse_connections("no route to host");

    let response = fixture.post(PUBLISH, standard_publish_body()).await;
    assert_status!(response, StatusCode::BAD_GATEWAY);
    assert!(response.body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("no route to host"));
}

#[tokio::test]
async fn test_publish_malformed_json() {
    let fixture = TestFixture::new().await;

    let response = fixture.post_raw(PUBLISH, "{\"campaign\": ").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_publish_missing_campaign() {
    let fixture = TestFixture::new().await;

    let response = fixture.post(PUBLISH, json!({"creatives": []})).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

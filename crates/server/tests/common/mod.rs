//! Common test utilities for router tests with a mock platform.
//!
//! This module provides a test fixture that builds the in-process router
//! with a [`MockConnector`] injected, so publish requests run the whole
//! pipeline without a real sales platform.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use spotsync_core::{
    testing::{MockConnector, MockPlatform, MOCK_BASE_URL},
    Config, IntegrationConfig, PlatformConfig, ServerConfig,
};

/// Re-export fixtures for test convenience
pub use spotsync_core::testing::fixtures;

/// Test fixture for router tests with a mock platform.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_publish() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture
///         .post("/api/v1/integration/publish", standard_publish_body())
///         .await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock platform, seeded with the standard scenario
    pub platform: Arc<MockPlatform>,
    /// Connector handing out `platform`
    pub connector: Arc<MockConnector>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a fixture with default integration settings.
    pub async fn new() -> Self {
        Self::with_integration(IntegrationConfig::default()).await
    }

    /// Create a fixture with custom integration settings.
    pub async fn with_integration(integration: IntegrationConfig) -> Self {
        let platform = Arc::new(MockPlatform::new());
        platform.require_credentials("agency", "secret").await;
        fixtures::seed_standard(&platform).await;

        let connector = Arc::new(MockConnector::new(Arc::clone(&platform)));

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            platform: PlatformConfig {
                base_url: MOCK_BASE_URL.to_string(),
                username: "agency".to_string(),
                password: "secret".to_string(),
                ..PlatformConfig::default()
            },
            integration,
        };

        let state = Arc::new(spotsync_server::state::AppState::new(
            config,
            Arc::clone(&connector) as Arc<dyn spotsync_core::PlatformConnector>,
        ));
        let router = spotsync_server::api::create_router(state);

        Self {
            router,
            platform,
            connector,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        let bytes = serde_json::to_vec(&body).unwrap();
        self.request("POST", path, Some(bytes)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request("POST", path, Some(body.as_bytes().to_vec()))
            .await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Vec<u8>>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(bytes) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(bytes)
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Publish request for the standard scenario.
pub fn standard_publish_body() -> Value {
    json!({
        "campaign": fixtures::standard_campaign(),
        "creatives": fixtures::standard_creatives(),
        "references": fixtures::standard_references(),
    })
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

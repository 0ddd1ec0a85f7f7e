//! REST client for the broadcast sales platform.
//!
//! Authentication is a JSON login returning a bearer token. The token is kept
//! in memory for the lifetime of the client and sent with every request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::campaign::DateRange;
use crate::config::PlatformConfig;
use crate::metrics::PLATFORM_REQUESTS;

use super::{
    Block, BookingGrid, BroadcastPlatform, Commercial, Credentials, ListQuery, MediaPlan, Page,
    PlatformError, ReferenceEntity, Session, Spot, SpotRequest,
};

/// HTTP implementation of [`BroadcastPlatform`].
pub struct HttpPlatform {
    client: Client,
    base_url: String,
    /// Bearer token of the current session.
    token: RwLock<Option<String>>,
}

impl HttpPlatform {
    /// Create a client for the configured platform.
    pub fn new(config: PlatformConfig) -> Result<Self, PlatformError> {
        if config.base_url.trim().is_empty() {
            return Err(PlatformError::NotConfigured(
                "platform base_url is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build a request carrying the session token.
    async fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, PlatformError> {
        let token = self
            .token
            .read()
            .await
            .clone()
            .ok_or(PlatformError::NotAuthenticated)?;

        Ok(self.client.request(method, self.url(path)).bearer_auth(token))
    }

    /// Send a request and decode its JSON body, recording the outcome.
    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, PlatformError> {
        let result = match request.send().await {
            Ok(response) => Self::decode(operation, response).await,
            Err(e) => Err(PlatformError::Http(e)),
        };

        let outcome = if result.is_ok() { "ok" } else { "error" };
        PLATFORM_REQUESTS
            .with_label_values(&[operation, outcome])
            .inc();

        result
    }

    async fn decode<T: DeserializeOwned>(
        operation: &'static str,
        response: Response,
    ) -> Result<T, PlatformError> {
        let status = response.status();
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Unauthorized(if body.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                body
            }));
        }
        if status == 404 {
            return Err(PlatformError::NotFound(operation.to_string()));
        }
        if status == 429 {
            return Err(PlatformError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            PlatformError::Parse(format!("Failed to parse {} response: {}", operation, e))
        })
    }

    async fn list<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        query: &ListQuery,
    ) -> Result<Page<T>, PlatformError> {
        debug!("Platform list {}: {:?}", path, query);

        let request = self
            .authorized(Method::GET, path)
            .await?
            .query(&query.to_query_pairs());

        let envelope: ListEnvelope<T> = self.send_json(operation, request).await?;
        Ok(envelope.into_page(query))
    }
}

#[async_trait]
impl BroadcastPlatform for HttpPlatform {
    async fn login(&self, credentials: &Credentials) -> Result<Session, PlatformError> {
        debug!("Platform login as '{}'", credentials.username);

        let request = self.client.post(self.url("/auth/login")).json(&LoginBody {
            username: &credentials.username,
            password: &credentials.password,
        });

        let session: Session = self.send_json("login", request).await?;
        if session.token.is_empty() {
            return Err(PlatformError::Unauthorized(
                "login returned an empty token".to_string(),
            ));
        }

        *self.token.write().await = Some(session.token.clone());
        Ok(session)
    }

    async fn list_advertisers(
        &self,
        query: &ListQuery,
    ) -> Result<Page<ReferenceEntity>, PlatformError> {
        self.list("list_advertisers", "/advertisers", query).await
    }

    async fn list_brands(&self, query: &ListQuery) -> Result<Page<ReferenceEntity>, PlatformError> {
        self.list("list_brands", "/brands", query).await
    }

    async fn list_channels(
        &self,
        query: &ListQuery,
    ) -> Result<Page<ReferenceEntity>, PlatformError> {
        self.list("list_channels", "/channels", query).await
    }

    async fn list_target_audiences(
        &self,
        query: &ListQuery,
    ) -> Result<Page<ReferenceEntity>, PlatformError> {
        self.list("list_target_audiences", "/target-audiences", query)
            .await
    }

    async fn list_commercials(&self, query: &ListQuery) -> Result<Page<Commercial>, PlatformError> {
        self.list("list_commercials", "/commercials", query).await
    }

    async fn list_media_plans(&self, query: &ListQuery) -> Result<Page<MediaPlan>, PlatformError> {
        self.list("list_media_plans", "/media-plans", query).await
    }

    async fn booking_grid(
        &self,
        channel_id: u64,
        range: &DateRange,
    ) -> Result<BookingGrid, PlatformError> {
        debug!("Platform booking grid: channel={}, range={}", channel_id, range);

        let request = self
            .authorized(Method::GET, &format!("/channels/{}/booking-grid", channel_id))
            .await?
            .query(&[
                ("date_from", range.start.to_string()),
                ("date_to", range.end.to_string()),
            ]);

        self.send_json("booking_grid", request).await
    }

    async fn block(&self, block_id: u64) -> Result<Block, PlatformError> {
        debug!("Platform get block: id={}", block_id);

        let request = self
            .authorized(Method::GET, &format!("/blocks/{}", block_id))
            .await?;

        self.send_json("block", request).await
    }

    async fn attach_spot(
        &self,
        block_id: u64,
        request: &SpotRequest,
    ) -> Result<Spot, PlatformError> {
        debug!(
            "Platform attach spot: block={}, commercial={}, media_plan={}",
            block_id, request.commercial_id, request.media_plan_id
        );

        let http_request = self
            .authorized(Method::POST, &format!("/blocks/{}/spots", block_id))
            .await?
            .json(request);

        self.send_json("attach_spot", http_request).await
    }

    async fn current_token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    fn base_url(&self) -> String {
        self.base_url.clone()
    }
}

// ============================================================================
// Wire types (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    data: Vec<T>,
    #[serde(default)]
    meta: Option<ListMeta>,
}

#[derive(Debug, Deserialize)]
struct ListMeta {
    page: Option<u32>,
    per_page: Option<u32>,
    total: Option<u64>,
}

impl<T> ListEnvelope<T> {
    fn into_page(self, query: &ListQuery) -> Page<T> {
        let (page, per_page, total) = match self.meta {
            Some(meta) => (
                meta.page.unwrap_or(query.page),
                meta.per_page.unwrap_or(query.per_page),
                meta.total,
            ),
            None => (query.page, query.per_page, None),
        };

        Page {
            items: self.data,
            page,
            per_page,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> PlatformConfig {
        PlatformConfig {
            base_url: base_url.to_string(),
            ..PlatformConfig::default()
        }
    }

    #[test]
    fn test_new_requires_base_url() {
        let result = HttpPlatform::new(config("  "));
        assert!(matches!(result, Err(PlatformError::NotConfigured(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpPlatform::new(config("http://platform.local/api/")).unwrap();
        assert_eq!(client.base_url(), "http://platform.local/api");
        assert_eq!(client.url("/blocks/7"), "http://platform.local/api/blocks/7");
    }

    #[tokio::test]
    async fn test_requests_before_login_fail() {
        let client = HttpPlatform::new(config("http://platform.local")).unwrap();
        assert!(client.current_token().await.is_none());

        let result = client.block(1).await;
        assert!(matches!(result, Err(PlatformError::NotAuthenticated)));
    }

    #[test]
    fn test_envelope_into_page_uses_meta() {
        let envelope: ListEnvelope<ReferenceEntity> = serde_json::from_str(
            r#"{"data": [{"id": 1, "name": "Fizz"}], "meta": {"page": 2, "per_page": 50, "total": 51}}"#,
        )
        .unwrap();
        let page = envelope.into_page(&ListQuery::new());
        assert_eq!(page.page, 2);
        assert_eq!(page.per_page, 50);
        assert_eq!(page.total, Some(51));
        assert_eq!(page.items[0].name, "Fizz");
    }

    #[test]
    fn test_envelope_without_meta_falls_back_to_query() {
        let envelope: ListEnvelope<Commercial> =
            serde_json::from_str(r#"{"data": [{"id": 201, "name": "Spot", "duration": 30}]}"#)
                .unwrap();
        let page = envelope.into_page(&ListQuery::new().with_page(3, 25));
        assert_eq!(page.page, 3);
        assert_eq!(page.per_page, 25);
        assert_eq!(page.total, None);
    }
}

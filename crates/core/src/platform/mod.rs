//! Client seam for the broadcast sales platform.
//!
//! The platform exposes session login, paginated reference catalogs, a
//! booking grid per channel and an endpoint for attaching spots to blocks.
//! [`HttpPlatform`] talks to the real REST API; tests use
//! [`crate::testing::MockPlatform`].

mod http;
mod types;

pub use http::HttpPlatform;
pub use types::*;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::campaign::DateRange;
use crate::config::PlatformConfig;

/// Errors that can occur when talking to the platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// HTTP transport failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials or token rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A request was issued before a session was established.
    #[error("not authenticated, call login first")]
    NotAuthenticated,

    /// Resource not found (404).
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded")]
    RateLimited,

    /// Platform returned an error status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to decode a response body.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Client could not be built from configuration.
    #[error("client not configured: {0}")]
    NotConfigured(String),
}

impl PlatformError {
    /// Whether the error means the credentials or session were rejected.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            PlatformError::Unauthorized(_) | PlatformError::NotAuthenticated
        )
    }
}

/// Operations the integration pipeline needs from the platform.
#[async_trait]
pub trait BroadcastPlatform: Send + Sync {
    /// Open a session with the given credentials.
    async fn login(&self, credentials: &Credentials) -> Result<Session, PlatformError>;

    async fn list_advertisers(
        &self,
        query: &ListQuery,
    ) -> Result<Page<ReferenceEntity>, PlatformError>;

    async fn list_brands(&self, query: &ListQuery) -> Result<Page<ReferenceEntity>, PlatformError>;

    async fn list_channels(
        &self,
        query: &ListQuery,
    ) -> Result<Page<ReferenceEntity>, PlatformError>;

    async fn list_target_audiences(
        &self,
        query: &ListQuery,
    ) -> Result<Page<ReferenceEntity>, PlatformError>;

    async fn list_commercials(&self, query: &ListQuery) -> Result<Page<Commercial>, PlatformError>;

    async fn list_media_plans(&self, query: &ListQuery) -> Result<Page<MediaPlan>, PlatformError>;

    /// Booking grid for a channel over a date range.
    async fn booking_grid(
        &self,
        channel_id: u64,
        range: &DateRange,
    ) -> Result<BookingGrid, PlatformError>;

    /// Full detail of one block.
    async fn block(&self, block_id: u64) -> Result<Block, PlatformError>;

    /// Attach a spot to a block.
    async fn attach_spot(
        &self,
        block_id: u64,
        request: &SpotRequest,
    ) -> Result<Spot, PlatformError>;

    /// Token of the current session, if any.
    async fn current_token(&self) -> Option<String>;

    /// Base URL requests are issued against.
    fn base_url(&self) -> String;
}

/// Builds platform clients from connection settings.
pub trait PlatformConnector: Send + Sync {
    fn connect(&self, config: &PlatformConfig)
        -> Result<Arc<dyn BroadcastPlatform>, PlatformError>;
}

/// Connector producing [`HttpPlatform`] clients.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpConnector;

impl PlatformConnector for HttpConnector {
    fn connect(
        &self,
        config: &PlatformConfig,
    ) -> Result<Arc<dyn BroadcastPlatform>, PlatformError> {
        Ok(Arc::new(HttpPlatform::new(config.clone())?))
    }
}

/// Walk a paginated listing one page at a time.
///
/// Stops at the first page that reports no further records or after
/// `max_pages` pages.
pub async fn collect_pages<T, F, Fut>(
    mut fetch: F,
    base: ListQuery,
    max_pages: u32,
) -> Result<Vec<T>, PlatformError>
where
    F: FnMut(ListQuery) -> Fut,
    Fut: Future<Output = Result<Page<T>, PlatformError>>,
{
    let mut items = Vec::new();
    let mut page_number = base.page.max(1);

    for _ in 0..max_pages.max(1) {
        let query = ListQuery {
            page: page_number,
            ..base.clone()
        };
        let page = fetch(query).await?;
        let more = page.has_more();
        items.extend(page.items);
        if !more {
            break;
        }
        page_number += 1;
    }

    Ok(items)
}

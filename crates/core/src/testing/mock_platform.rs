//! Mock broadcast platform for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::campaign::DateRange;
use crate::platform::{
    Block, BookingGrid, BroadcastPlatform, Commercial, Credentials, ListQuery, MediaPlan, Page,
    PlatformError, ReferenceEntity, Session, Spot, SpotRequest,
};

/// Base URL reported by the mock.
pub const MOCK_BASE_URL: &str = "http://mock.platform/api";

/// A recorded platform call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedPlatformCall {
    Login { username: String },
    ListAdvertisers { name: Option<String> },
    ListBrands { name: Option<String> },
    ListChannels { name: Option<String> },
    ListTargetAudiences { name: Option<String> },
    ListCommercials { page: u32 },
    ListMediaPlans { page: u32 },
    BookingGrid { channel_id: u64, range: DateRange },
    Block { block_id: u64 },
    AttachSpot { block_id: u64, request: SpotRequest },
}

impl RecordedPlatformCall {
    /// Whether this call is a reference dictionary lookup.
    pub fn is_reference_lookup(&self) -> bool {
        matches!(
            self,
            RecordedPlatformCall::ListAdvertisers { .. }
                | RecordedPlatformCall::ListBrands { .. }
                | RecordedPlatformCall::ListChannels { .. }
                | RecordedPlatformCall::ListTargetAudiences { .. }
        )
    }
}

/// Mock implementation of the BroadcastPlatform trait.
///
/// Provides controllable behavior for testing:
/// - Configurable catalogs, booking grids and blocks
/// - Credential checking and spot refusal
/// - Call recording for assertions
/// - One-shot error injection
///
/// # Example
///
/// ```rust,ignore
/// use spotsync_core::testing::{fixtures, MockPlatform};
///
/// let platform = MockPlatform::new();
/// platform.add_channel(fixtures::entity(1000, "Channel One")).await;
/// platform.add_grid(fixtures::booking_grid(1000, "2024-03-01", 2, 7)).await;
///
/// let page = platform.list_channels(&ListQuery::new().with_name("channel one")).await?;
/// assert_eq!(page.items.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockPlatform {
    /// Accepted credentials; any credentials are accepted when unset.
    credentials: Arc<RwLock<Option<Credentials>>>,
    advertisers: Arc<RwLock<Vec<ReferenceEntity>>>,
    brands: Arc<RwLock<Vec<ReferenceEntity>>>,
    channels: Arc<RwLock<Vec<ReferenceEntity>>>,
    target_audiences: Arc<RwLock<Vec<ReferenceEntity>>>,
    commercials: Arc<RwLock<Vec<Commercial>>>,
    media_plans: Arc<RwLock<Vec<MediaPlan>>>,
    /// Booking grids by remote channel id.
    grids: Arc<RwLock<HashMap<u64, BookingGrid>>>,
    /// Block details by id.
    blocks: Arc<RwLock<HashMap<u64, Block>>>,
    /// When set, every spot attachment is refused with this message.
    spot_refusal: Arc<RwLock<Option<String>>>,
    token: Arc<RwLock<Option<String>>>,
    calls: Arc<RwLock<Vec<RecordedPlatformCall>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<PlatformError>>>,
    next_spot_id: AtomicU64,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    /// Create a new empty mock platform.
    pub fn new() -> Self {
        Self {
            credentials: Arc::new(RwLock::new(None)),
            advertisers: Arc::new(RwLock::new(Vec::new())),
            brands: Arc::new(RwLock::new(Vec::new())),
            channels: Arc::new(RwLock::new(Vec::new())),
            target_audiences: Arc::new(RwLock::new(Vec::new())),
            commercials: Arc::new(RwLock::new(Vec::new())),
            media_plans: Arc::new(RwLock::new(Vec::new())),
            grids: Arc::new(RwLock::new(HashMap::new())),
            blocks: Arc::new(RwLock::new(HashMap::new())),
            spot_refusal: Arc::new(RwLock::new(None)),
            token: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            next_spot_id: AtomicU64::new(5000),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Only accept these credentials at login.
    pub async fn require_credentials(&self, username: &str, password: &str) {
        *self.credentials.write().await = Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });
    }

    pub async fn add_advertiser(&self, entity: ReferenceEntity) {
        self.advertisers.write().await.push(entity);
    }

    pub async fn add_brand(&self, entity: ReferenceEntity) {
        self.brands.write().await.push(entity);
    }

    pub async fn add_channel(&self, entity: ReferenceEntity) {
        self.channels.write().await.push(entity);
    }

    pub async fn add_target_audience(&self, entity: ReferenceEntity) {
        self.target_audiences.write().await.push(entity);
    }

    pub async fn add_commercial(&self, commercial: Commercial) {
        self.commercials.write().await.push(commercial);
    }

    pub async fn add_media_plan(&self, plan: MediaPlan) {
        self.media_plans.write().await.push(plan);
    }

    /// Register a booking grid and a block for every slot it references.
    pub async fn add_grid(&self, grid: BookingGrid) {
        {
            let mut blocks = self.blocks.write().await;
            for day in &grid.days {
                for program in &day.programs {
                    for slot in &program.slots {
                        blocks.entry(slot.id).or_insert_with(|| Block {
                            id: slot.id,
                            channel_id: grid.channel_id,
                            date: day.date,
                            start_time: None,
                            end_time: None,
                            block_type: Some("commercial".to_string()),
                            free_seconds: Some(120),
                            program_release_id: Some(program.id),
                        });
                    }
                }
            }
        }
        self.grids.write().await.insert(grid.channel_id, grid);
    }

    /// Register or replace block detail.
    pub async fn add_block(&self, block: Block) {
        self.blocks.write().await.insert(block.id, block);
    }

    /// Refuse every spot attachment with the given message.
    pub async fn refuse_spots(&self, message: &str) {
        *self.spot_refusal.write().await = Some(message.to_string());
    }

    // =========================================================================
    // Call Recording
    // =========================================================================

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedPlatformCall> {
        self.calls.read().await.clone()
    }

    /// Clear recorded calls.
    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
    }

    /// Number of reference dictionary lookups performed.
    pub async fn reference_lookup_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.is_reference_lookup())
            .count()
    }

    /// Spot attachments attempted so far.
    pub async fn attach_attempts(&self) -> Vec<(u64, SpotRequest)> {
        self.calls
            .read()
            .await
            .iter()
            .filter_map(|c| match c {
                RecordedPlatformCall::AttachSpot { block_id, request } => {
                    Some((*block_id, request.clone()))
                }
                _ => None,
            })
            .collect()
    }

    async fn record(&self, call: RecordedPlatformCall) {
        self.calls.write().await.push(call);
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: PlatformError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    async fn take_error(&self) -> Result<(), PlatformError> {
        match self.next_error.write().await.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn ensure_session(&self) -> Result<(), PlatformError> {
        if self.token.read().await.is_some() {
            Ok(())
        } else {
            Err(PlatformError::NotAuthenticated)
        }
    }

    async fn list_entities(
        &self,
        source: &RwLock<Vec<ReferenceEntity>>,
        query: &ListQuery,
    ) -> Result<Page<ReferenceEntity>, PlatformError> {
        self.take_error().await?;
        self.ensure_session().await?;

        let items: Vec<ReferenceEntity> = source
            .read()
            .await
            .iter()
            .filter(|e| match &query.name {
                Some(name) => e.name.to_lowercase().contains(&name.to_lowercase()),
                None => true,
            })
            .filter(|e| match query.advertiser_id {
                Some(id) => e.advertiser_id == Some(id),
                None => true,
            })
            .cloned()
            .collect();

        Ok(paginate(items, query))
    }
}

/// Slice `items` according to the query's page settings.
fn paginate<T>(items: Vec<T>, query: &ListQuery) -> Page<T> {
    let total = items.len() as u64;
    let per_page = query.per_page.max(1);
    let skip = (query.page.max(1) - 1) as usize * per_page as usize;

    Page {
        items: items.into_iter().skip(skip).take(per_page as usize).collect(),
        page: query.page.max(1),
        per_page,
        total: Some(total),
    }
}

#[async_trait]
impl BroadcastPlatform for MockPlatform {
    async fn login(&self, credentials: &Credentials) -> Result<Session, PlatformError> {
        self.record(RecordedPlatformCall::Login {
            username: credentials.username.clone(),
        })
        .await;
        self.take_error().await?;

        if let Some(expected) = self.credentials.read().await.as_ref() {
            if expected != credentials {
                return Err(PlatformError::Unauthorized(
                    "invalid username or password".to_string(),
                ));
            }
        }

        let token = format!("mock-token-{}", credentials.username);
        *self.token.write().await = Some(token.clone());
        Ok(Session {
            token,
            expires_at: None,
        })
    }

    async fn list_advertisers(
        &self,
        query: &ListQuery,
    ) -> Result<Page<ReferenceEntity>, PlatformError> {
        self.record(RecordedPlatformCall::ListAdvertisers {
            name: query.name.clone(),
        })
        .await;
        self.list_entities(&self.advertisers, query).await
    }

    async fn list_brands(&self, query: &ListQuery) -> Result<Page<ReferenceEntity>, PlatformError> {
        self.record(RecordedPlatformCall::ListBrands {
            name: query.name.clone(),
        })
        .await;
        self.list_entities(&self.brands, query).await
    }

    async fn list_channels(
        &self,
        query: &ListQuery,
    ) -> Result<Page<ReferenceEntity>, PlatformError> {
        self.record(RecordedPlatformCall::ListChannels {
            name: query.name.clone(),
        })
        .await;
        self.list_entities(&self.channels, query).await
    }

    async fn list_target_audiences(
        &self,
        query: &ListQuery,
    ) -> Result<Page<ReferenceEntity>, PlatformError> {
        self.record(RecordedPlatformCall::ListTargetAudiences {
            name: query.name.clone(),
        })
        .await;
        self.list_entities(&self.target_audiences, query).await
    }

    async fn list_commercials(&self, query: &ListQuery) -> Result<Page<Commercial>, PlatformError> {
        self.record(RecordedPlatformCall::ListCommercials { page: query.page })
            .await;
        self.take_error().await?;
        self.ensure_session().await?;

        let items = self.commercials.read().await.clone();
        Ok(paginate(items, query))
    }

    async fn list_media_plans(&self, query: &ListQuery) -> Result<Page<MediaPlan>, PlatformError> {
        self.record(RecordedPlatformCall::ListMediaPlans { page: query.page })
            .await;
        self.take_error().await?;
        self.ensure_session().await?;

        let items = self.media_plans.read().await.clone();
        Ok(paginate(items, query))
    }

    async fn booking_grid(
        &self,
        channel_id: u64,
        range: &DateRange,
    ) -> Result<BookingGrid, PlatformError> {
        self.record(RecordedPlatformCall::BookingGrid {
            channel_id,
            range: *range,
        })
        .await;
        self.take_error().await?;
        self.ensure_session().await?;

        let grid = self.grids.read().await.get(&channel_id).cloned();
        let mut grid = grid.unwrap_or(BookingGrid {
            channel_id,
            days: Vec::new(),
        });
        grid.days.retain(|day| range.contains(day.date));
        Ok(grid)
    }

    async fn block(&self, block_id: u64) -> Result<Block, PlatformError> {
        self.record(RecordedPlatformCall::Block { block_id }).await;
        self.take_error().await?;
        self.ensure_session().await?;

        self.blocks
            .read()
            .await
            .get(&block_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("block {}", block_id)))
    }

    async fn attach_spot(
        &self,
        block_id: u64,
        request: &SpotRequest,
    ) -> Result<Spot, PlatformError> {
        self.record(RecordedPlatformCall::AttachSpot {
            block_id,
            request: request.clone(),
        })
        .await;
        self.take_error().await?;
        self.ensure_session().await?;

        if let Some(message) = self.spot_refusal.read().await.clone() {
            return Err(PlatformError::Api {
                status: 422,
                message,
            });
        }
        if !self.blocks.read().await.contains_key(&block_id) {
            return Err(PlatformError::NotFound(format!("block {}", block_id)));
        }

        Ok(Spot {
            id: self.next_spot_id.fetch_add(1, Ordering::SeqCst),
            block_id,
            commercial_id: request.commercial_id,
            media_plan_id: request.media_plan_id,
        })
    }

    async fn current_token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    fn base_url(&self) -> String {
        MOCK_BASE_URL.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    async fn logged_in() -> MockPlatform {
        let platform = MockPlatform::new();
        platform
            .login(&fixtures::credentials("agency", "secret"))
            .await
            .unwrap();
        platform
    }

    #[tokio::test]
    async fn test_login_checks_credentials() {
        let platform = MockPlatform::new();
        platform.require_credentials("agency", "secret").await;

        let result = platform.login(&fixtures::credentials("agency", "wrong")).await;
        assert!(matches!(result, Err(PlatformError::Unauthorized(_))));
        assert!(platform.current_token().await.is_none());

        let session = platform
            .login(&fixtures::credentials("agency", "secret"))
            .await
            .unwrap();
        assert_eq!(session.token, "mock-token-agency");
    }

    #[tokio::test]
    async fn test_requires_session() {
        let platform = MockPlatform::new();
        let result = platform.list_brands(&ListQuery::new()).await;
        assert!(matches!(result, Err(PlatformError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_list_filters_by_name_and_paginates() {
        let platform = logged_in().await;
        platform.add_brand(fixtures::entity(1, "Fizz Cola")).await;
        platform.add_brand(fixtures::entity(2, "Fizz Zero")).await;
        platform.add_brand(fixtures::entity(3, "Crunch")).await;

        let page = platform
            .list_brands(&ListQuery::new().with_name("fizz"))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);

        let page = platform
            .list_brands(&ListQuery::new().with_page(2, 2))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, 3);
        assert_eq!(page.total, Some(3));
    }

    #[tokio::test]
    async fn test_add_grid_registers_blocks() {
        let platform = logged_in().await;
        platform
            .add_grid(fixtures::booking_grid(1000, "2024-03-01", 2, 3))
            .await;

        let grid = platform
            .booking_grid(1000, &fixtures::date_range("2024-03-01", "2024-03-01"))
            .await
            .unwrap();
        assert_eq!(grid.days.len(), 1);

        let slot_id = grid.days[0].programs[0].slots[0].id;
        let block = platform.block(slot_id).await.unwrap();
        assert_eq!(block.channel_id, 1000);
    }

    #[tokio::test]
    async fn test_refused_spot() {
        let platform = logged_in().await;
        platform
            .add_grid(fixtures::booking_grid(1000, "2024-03-01", 1, 1))
            .await;
        platform.refuse_spots("block is sold out").await;

        let request = SpotRequest {
            commercial_id: 201,
            media_plan_id: 700,
        };
        let result = platform.attach_spot(1_000_000, &request).await;
        assert!(matches!(result, Err(PlatformError::Api { status: 422, .. })));
        assert_eq!(platform.attach_attempts().await.len(), 1);
    }

    #[tokio::test]
    async fn test_next_error_is_one_shot() {
        let platform = logged_in().await;
        platform.set_next_error(PlatformError::RateLimited).await;

        assert!(platform.list_commercials(&ListQuery::new()).await.is_err());
        assert!(platform.list_commercials(&ListQuery::new()).await.is_ok());
    }
}

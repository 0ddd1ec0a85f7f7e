//! Campaign publishing API handler.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use spotsync_core::{
    Campaign, Creative, IntegrationResult, IntegrationService, PlatformConfig, ReferenceNames,
    TracingObserver,
};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub campaign: Campaign,
    #[serde(default)]
    pub creatives: Vec<Creative>,
    /// Local names used to find unmapped reference ids on the platform.
    #[serde(default)]
    pub references: ReferenceNames,
    /// Replaces the configured platform connection for this request.
    #[serde(default)]
    pub connection: Option<PlatformConfig>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/integration/publish
///
/// Publish one campaign to the broadcast platform. Pipeline failures are
/// reported in the result body; only requests that cannot start a run get
/// an error status.
pub async fn publish(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PublishRequest>,
) -> Result<Json<IntegrationResult>, ApiError> {
    request
        .campaign
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;

    let connection = request
        .connection
        .unwrap_or_else(|| state.config().platform.clone());

    let platform = state.connector().connect(&connection).map_err(|e| {
        warn!("Cannot connect to platform at '{}': {}", connection.base_url, e);
        api_error(StatusCode::BAD_GATEWAY, e)
    })?;

    let service = IntegrationService::new(
        platform,
        &connection,
        state.config().integration.clone(),
    )
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?;

    let observer = TracingObserver::new(service.run_id().to_string());
    let mut service = service
        .with_references(request.references)
        .with_observer(Arc::new(observer));

    info!(
        run_id = %service.run_id(),
        "Publish requested for campaign {}",
        request.campaign.id
    );

    let result = service
        .handle_campaign_publish(&request.campaign, &request.creatives)
        .await;
    Ok(Json(result))
}

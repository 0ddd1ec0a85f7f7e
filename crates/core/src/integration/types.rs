//! Types for integration runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::campaign::CampaignError;
use crate::mapping::{EntityKind, MappingError};
use crate::platform::{PlatformError, Spot};
use crate::progress::ProgressEntry;

use super::diagnostics::DiagnosticRequest;

/// Errors that abort an integration run.
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// The platform rejected the credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A referenced entity could not be resolved on the platform.
    #[error("lookup failed for {kind} {local_id}: {reason}")]
    Lookup {
        kind: EntityKind,
        local_id: u64,
        reason: String,
    },

    /// Any other platform call failed.
    #[error("platform request failed: {0}")]
    Request(#[from] PlatformError),

    /// Identifier cache refused an entry.
    #[error("identifier mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// The published campaign failed shape checks.
    #[error("invalid campaign: {0}")]
    InvalidCampaign(#[from] CampaignError),

    /// The platform refused a spot and the run is configured to fail on that.
    #[error("spot rejected for block {block_id}: {message}")]
    SpotRejected { block_id: u64, message: String },
}

impl IntegrationError {
    pub(crate) fn lookup(kind: EntityKind, local_id: u64, reason: impl Into<String>) -> Self {
        IntegrationError::Lookup {
            kind,
            local_id,
            reason: reason.into(),
        }
    }
}

/// Phases of one integration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Authenticating,
    SyncingDictionaries,
    FindingBlocks,
    MappingCommercials,
    ReservingSpots,
    Complete,
    Failed,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Idle => "idle",
            RunPhase::Authenticating => "authenticating",
            RunPhase::SyncingDictionaries => "syncing_dictionaries",
            RunPhase::FindingBlocks => "finding_blocks",
            RunPhase::MappingCommercials => "mapping_commercials",
            RunPhase::ReservingSpots => "reserving_spots",
            RunPhase::Complete => "complete",
            RunPhase::Failed => "error",
        }
    }

    /// Progress percentage reported once the phase finishes.
    pub fn progress(&self) -> i8 {
        match self {
            RunPhase::Idle => 0,
            RunPhase::Authenticating => 10,
            RunPhase::SyncingDictionaries => 30,
            RunPhase::FindingBlocks => 50,
            RunPhase::MappingCommercials => 70,
            RunPhase::ReservingSpots => 90,
            RunPhase::Complete => 100,
            RunPhase::Failed => crate::progress::FAILED_PROGRESS,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Complete | RunPhase::Failed)
    }
}

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    Complete,
    Partial,
    Failed,
}

impl IntegrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationStatus::Complete => "complete",
            IntegrationStatus::Partial => "partial",
            IntegrationStatus::Failed => "failed",
        }
    }
}

/// Result of publishing a campaign.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntegrationResult {
    pub run_id: Uuid,
    pub success: bool,
    pub status: IntegrationStatus,
    /// Remote ids of the spots created by this run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_ids: Option<Vec<u64>>,
    /// Remote commercial ids matched to the published creatives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_ids: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Trailing progress entries, attached when something went wrong.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ProgressEntry>>,
}

/// Outcome of trying to reserve a spot in one block.
#[derive(Debug, Clone)]
pub enum ReservationOutcome {
    Reserved(Vec<Spot>),
    /// No media plan or commercial was eligible.
    NothingToReserve { reason: String },
    /// The platform refused the spot.
    Failed {
        message: String,
        diagnostic: DiagnosticRequest,
    },
}

impl ReservationOutcome {
    pub fn spot_ids(&self) -> Vec<u64> {
        match self {
            ReservationOutcome::Reserved(spots) => spots.iter().map(|s| s.id).collect(),
            _ => Vec::new(),
        }
    }
}

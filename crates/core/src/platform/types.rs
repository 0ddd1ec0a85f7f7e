//! Records exchanged with the broadcast sales platform.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::campaign::DateRange;

/// Login credentials for the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// An authenticated platform session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Paging and filters for catalog listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-indexed page number.
    pub page: u32,
    pub per_page: u32,
    pub name: Option<String>,
    pub advertiser_id: Option<u64>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 100,
            name: None,
            advertiser_id: None,
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_advertiser(mut self, advertiser_id: u64) -> Self {
        self.advertiser_id = Some(advertiser_id);
        self
    }

    pub fn with_page(mut self, page: u32, per_page: u32) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    /// Query-string pairs for an HTTP listing request.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(name) = &self.name {
            pairs.push(("name", name.clone()));
        }
        if let Some(advertiser_id) = self.advertiser_id {
            pairs.push(("advertiser_id", advertiser_id.to_string()));
        }
        pairs
    }
}

/// One page of a catalog listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    /// Total number of records, when the platform reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl<T> Page<T> {
    /// Whether more pages may follow this one.
    pub fn has_more(&self) -> bool {
        if self.items.is_empty() || (self.items.len() as u32) < self.per_page {
            return false;
        }
        match self.total {
            Some(total) => u64::from(self.page) * u64::from(self.per_page) < total,
            None => true,
        }
    }
}

/// Advertiser, brand, channel or target audience on the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceEntity {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertiser_id: Option<u64>,
}

/// A playable creative asset registered on the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Commercial {
    pub id: u64,
    pub name: String,
    /// Duration in seconds.
    #[serde(default)]
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advertiser_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<u64>,
}

/// A planning record grouping eligible commercials over a date range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaPlan {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub commercial_ids: Vec<u64>,
}

/// Slot reference inside a booking grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotRef {
    pub id: u64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// A program release with its advertising slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramRelease {
    pub id: u64,
    #[serde(default)]
    pub program_name: String,
    #[serde(default)]
    pub slots: Vec<SlotRef>,
}

/// All program releases airing on one date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub programs: Vec<ProgramRelease>,
}

/// Booking grid for a channel over a date range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingGrid {
    pub channel_id: u64,
    #[serde(default)]
    pub days: Vec<GridDay>,
}

/// Full detail of a schedulable advertising slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub id: u64,
    pub channel_id: u64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,
    /// Unsold seconds remaining in the block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_release_id: Option<u64>,
}

/// Payload for attaching a spot to a block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpotRequest {
    pub commercial_id: u64,
    pub media_plan_id: u64,
}

/// A confirmed spot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Spot {
    pub id: u64,
    pub block_id: u64,
    pub commercial_id: u64,
    pub media_plan_id: u64,
}

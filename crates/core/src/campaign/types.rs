use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mapping::EntityKind;

/// Shape errors in a published campaign.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CampaignError {
    #[error("invalid date range for {owner}: {start} is after {end}")]
    InvertedDateRange {
        owner: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("placement {placement_id} belongs to campaign {actual}, expected {expected}")]
    ForeignPlacement {
        placement_id: u64,
        expected: u64,
        actual: u64,
    },

    #[error("negative budget for {0}")]
    NegativeBudget(String),
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// Number of calendar days covered, 0 for an inverted range.
    pub fn days(&self) -> u32 {
        if !self.is_valid() {
            return 0;
        }
        (self.end - self.start).num_days() as u32 + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Lifecycle of a campaign on the local side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
}

/// An advertising campaign.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    pub id: u64,
    pub name: String,
    pub date_range: DateRange,
    #[serde(default)]
    pub budget: f64,
    pub advertiser_id: u64,
    #[serde(default)]
    pub status: CampaignStatus,
    /// Creatives attached to the campaign as a whole.
    #[serde(default)]
    pub creative_ids: Vec<u64>,
    #[serde(default)]
    pub placements: Vec<Placement>,
}

/// A placement of a campaign on one channel for one brand and audience.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    pub id: u64,
    pub campaign_id: u64,
    pub channel_id: u64,
    pub brand_id: u64,
    pub target_audience_id: u64,
    pub date_range: DateRange,
    #[serde(default)]
    pub budget: f64,
    /// Lower values are scheduled first.
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub creative_ids: Vec<u64>,
}

/// A creative asset on the local side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Creative {
    pub id: u64,
    pub name: String,
    /// Duration in seconds.
    pub duration: u32,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub brand_id: Option<u64>,
    #[serde(default)]
    pub advertiser_id: Option<u64>,
}

impl Campaign {
    /// Basic shape checks: date ranges are ordered, budgets are non-negative
    /// and every placement points back at this campaign.
    pub fn validate(&self) -> Result<(), CampaignError> {
        if !self.date_range.is_valid() {
            return Err(CampaignError::InvertedDateRange {
                owner: format!("campaign {}", self.id),
                start: self.date_range.start,
                end: self.date_range.end,
            });
        }
        if self.budget < 0.0 {
            return Err(CampaignError::NegativeBudget(format!("campaign {}", self.id)));
        }

        for placement in &self.placements {
            if placement.campaign_id != self.id {
                return Err(CampaignError::ForeignPlacement {
                    placement_id: placement.id,
                    expected: self.id,
                    actual: placement.campaign_id,
                });
            }
            if !placement.date_range.is_valid() {
                return Err(CampaignError::InvertedDateRange {
                    owner: format!("placement {}", placement.id),
                    start: placement.date_range.start,
                    end: placement.date_range.end,
                });
            }
            if placement.budget < 0.0 {
                return Err(CampaignError::NegativeBudget(format!(
                    "placement {}",
                    placement.id
                )));
            }
        }

        Ok(())
    }

    /// Placements ordered by priority, ties broken by id.
    pub fn placements_by_priority(&self) -> Vec<&Placement> {
        let mut placements: Vec<&Placement> = self.placements.iter().collect();
        placements.sort_by_key(|p| (p.priority, p.id));
        placements
    }

    /// Distinct local ids of one entity category referenced by this campaign
    /// and the given creatives, in ascending order.
    pub fn referenced_ids(&self, kind: EntityKind, creatives: &[Creative]) -> BTreeSet<u64> {
        match kind {
            EntityKind::Advertiser => std::iter::once(self.advertiser_id)
                .chain(creatives.iter().filter_map(|c| c.advertiser_id))
                .collect(),
            EntityKind::Brand => self
                .placements
                .iter()
                .map(|p| p.brand_id)
                .chain(creatives.iter().filter_map(|c| c.brand_id))
                .collect(),
            EntityKind::Channel => self.placements.iter().map(|p| p.channel_id).collect(),
            EntityKind::TargetAudience => self
                .placements
                .iter()
                .map(|p| p.target_audience_id)
                .collect(),
        }
    }
}

/// Human-readable names of local reference entities, keyed by local id.
///
/// The remote platform is searched by name, so every local id that is not
/// already mapped needs an entry here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReferenceNames {
    #[serde(default)]
    pub advertisers: HashMap<u64, String>,
    #[serde(default)]
    pub brands: HashMap<u64, String>,
    #[serde(default)]
    pub channels: HashMap<u64, String>,
    #[serde(default)]
    pub target_audiences: HashMap<u64, String>,
}

impl ReferenceNames {
    pub fn name_of(&self, kind: EntityKind, local_id: u64) -> Option<&str> {
        let table = match kind {
            EntityKind::Advertiser => &self.advertisers,
            EntityKind::Brand => &self.brands,
            EntityKind::Channel => &self.channels,
            EntityKind::TargetAudience => &self.target_audiences,
        };
        table.get(&local_id).map(String::as_str)
    }

    pub fn with_name(mut self, kind: EntityKind, local_id: u64, name: &str) -> Self {
        let table = match kind {
            EntityKind::Advertiser => &mut self.advertisers,
            EntityKind::Brand => &mut self.brands,
            EntityKind::Channel => &mut self.channels,
            EntityKind::TargetAudience => &mut self.target_audiences,
        };
        table.insert(local_id, name.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(date(start), date(end))
    }

    fn placement(id: u64, priority: u32) -> Placement {
        Placement {
            id,
            campaign_id: 1,
            channel_id: 10,
            brand_id: 20 + id,
            target_audience_id: 30,
            date_range: range("2024-03-01", "2024-03-07"),
            budget: 100.0,
            priority,
            creative_ids: vec![],
        }
    }

    fn campaign(placements: Vec<Placement>) -> Campaign {
        Campaign {
            id: 1,
            name: "Spring".to_string(),
            date_range: range("2024-03-01", "2024-03-31"),
            budget: 1000.0,
            advertiser_id: 5,
            status: CampaignStatus::Active,
            creative_ids: vec![201],
            placements,
        }
    }

    #[test]
    fn test_date_range_days() {
        assert_eq!(range("2024-03-01", "2024-03-01").days(), 1);
        assert_eq!(range("2024-02-28", "2024-03-01").days(), 3);
        assert_eq!(range("2024-03-02", "2024-03-01").days(), 0);
        assert!(range("2024-03-01", "2024-03-07").contains(date("2024-03-07")));
        assert!(!range("2024-03-01", "2024-03-07").contains(date("2024-03-08")));
    }

    #[test]
    fn test_validate_accepts_well_formed_campaign() {
        assert!(campaign(vec![placement(1, 0)]).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_placement_range() {
        let mut p = placement(7, 0);
        p.date_range = range("2024-03-09", "2024-03-01");
        let err = campaign(vec![p]).validate().unwrap_err();
        assert!(matches!(err, CampaignError::InvertedDateRange { ref owner, .. } if owner == "placement 7"));
    }

    #[test]
    fn test_validate_rejects_foreign_placement() {
        let mut p = placement(3, 0);
        p.campaign_id = 99;
        let err = campaign(vec![p]).validate().unwrap_err();
        assert_eq!(
            err,
            CampaignError::ForeignPlacement {
                placement_id: 3,
                expected: 1,
                actual: 99
            }
        );
    }

    #[test]
    fn test_referenced_ids_are_distinct_and_sorted() {
        let c = campaign(vec![placement(2, 0), placement(1, 0)]);
        let creatives = vec![Creative {
            id: 201,
            name: "Spot A".to_string(),
            duration: 30,
            file_url: None,
            format: None,
            brand_id: Some(21),
            advertiser_id: Some(6),
        }];

        let brands: Vec<u64> = c.referenced_ids(EntityKind::Brand, &creatives).into_iter().collect();
        assert_eq!(brands, vec![21, 22]);

        let advertisers: Vec<u64> = c
            .referenced_ids(EntityKind::Advertiser, &creatives)
            .into_iter()
            .collect();
        assert_eq!(advertisers, vec![5, 6]);

        assert_eq!(c.referenced_ids(EntityKind::Channel, &creatives).len(), 1);
    }

    #[test]
    fn test_placements_by_priority() {
        let c = campaign(vec![placement(3, 2), placement(1, 5), placement(2, 2)]);
        let ids: Vec<u64> = c.placements_by_priority().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_deserialize_campaign_defaults() {
        let json = r#"{
            "id": 1,
            "name": "Spring",
            "date_range": {"start": "2024-03-01", "end": "2024-03-31"},
            "advertiser_id": 5
        }"#;
        let c: Campaign = serde_json::from_str(json).unwrap();
        assert_eq!(c.status, CampaignStatus::Draft);
        assert!(c.placements.is_empty());
        assert_eq!(c.budget, 0.0);
    }

    #[test]
    fn test_reference_names_lookup() {
        let names = ReferenceNames::default()
            .with_name(EntityKind::Brand, 21, "Fizz")
            .with_name(EntityKind::Channel, 10, "Channel One");
        assert_eq!(names.name_of(EntityKind::Brand, 21), Some("Fizz"));
        assert_eq!(names.name_of(EntityKind::Channel, 10), Some("Channel One"));
        assert_eq!(names.name_of(EntityKind::Advertiser, 21), None);
    }
}

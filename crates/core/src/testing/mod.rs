//! Testing utilities and mock implementations.
//!
//! [`MockPlatform`] stands in for the broadcast sales platform so the whole
//! publishing pipeline can run without a network.
//!
//! # Example
//!
//! ```rust,ignore
//! use spotsync_core::testing::{fixtures, MockPlatform};
//!
//! let platform = MockPlatform::new();
//! fixtures::seed_standard(&platform).await;
//!
//! let mut service = IntegrationService::new(Arc::new(platform), &config, settings)?
//!     .with_references(fixtures::standard_references());
//! let result = service
//!     .handle_campaign_publish(&fixtures::standard_campaign(), &fixtures::standard_creatives())
//!     .await;
//! ```

mod mock_connector;
mod mock_platform;

pub use mock_connector::MockConnector;
pub use mock_platform::{MockPlatform, RecordedPlatformCall, MOCK_BASE_URL};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::NaiveDate;

    use super::MockPlatform;
    use crate::campaign::{Campaign, CampaignStatus, Creative, DateRange, Placement, ReferenceNames};
    use crate::mapping::EntityKind;
    use crate::platform::{
        BookingGrid, Commercial, Credentials, GridDay, MediaPlan, ProgramRelease, ReferenceEntity,
        SlotRef,
    };

    pub fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Parse a `YYYY-MM-DD` date.
    pub fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("fixture dates are YYYY-MM-DD")
    }

    pub fn date_range(start: &str, end: &str) -> DateRange {
        DateRange::new(date(start), date(end))
    }

    pub fn entity(id: u64, name: &str) -> ReferenceEntity {
        ReferenceEntity {
            id,
            name: name.to_string(),
            advertiser_id: None,
        }
    }

    pub fn placement(
        id: u64,
        campaign_id: u64,
        channel_id: u64,
        brand_id: u64,
        target_audience_id: u64,
        date_range: DateRange,
    ) -> Placement {
        Placement {
            id,
            campaign_id,
            channel_id,
            brand_id,
            target_audience_id,
            date_range,
            budget: 1000.0,
            priority: 1,
            creative_ids: Vec::new(),
        }
    }

    /// A campaign over March 2024.
    pub fn campaign(id: u64, advertiser_id: u64, placements: Vec<Placement>) -> Campaign {
        Campaign {
            id,
            name: format!("Campaign {}", id),
            date_range: date_range("2024-03-01", "2024-03-31"),
            budget: 10_000.0,
            advertiser_id,
            status: CampaignStatus::Active,
            creative_ids: Vec::new(),
            placements,
        }
    }

    pub fn creative(id: u64, name: &str) -> Creative {
        Creative {
            id,
            name: name.to_string(),
            duration: 30,
            file_url: Some(format!("https://cdn.example.com/creatives/{}.mp4", id)),
            format: Some("mp4".to_string()),
            brand_id: None,
            advertiser_id: None,
        }
    }

    pub fn commercial(id: u64, name: &str) -> Commercial {
        Commercial {
            id,
            name: name.to_string(),
            duration: 30,
            advertiser_id: None,
            brand_id: None,
        }
    }

    pub fn media_plan(id: u64, date_range: Option<DateRange>, commercial_ids: Vec<u64>) -> MediaPlan {
        MediaPlan {
            id,
            name: format!("Plan {}", id),
            date_range,
            commercial_ids,
        }
    }

    /// A grid of `days` consecutive days from `start`, each with one program
    /// release holding `slots` available slots.
    ///
    /// Slot ids are `channel_id * 1000 + day * 100 + slot`, so keep `slots`
    /// under 100.
    pub fn booking_grid(channel_id: u64, start: &str, days: u64, slots: u64) -> BookingGrid {
        let first = date(start);
        BookingGrid {
            channel_id,
            days: (0..days)
                .map(|day| GridDay {
                    date: first + chrono::Days::new(day),
                    programs: vec![ProgramRelease {
                        id: channel_id * 100 + day,
                        program_name: format!("Program {}", day + 1),
                        slots: (0..slots)
                            .map(|slot| SlotRef {
                                id: channel_id * 1000 + day * 100 + slot,
                                available: true,
                            })
                            .collect(),
                    }],
                })
                .collect(),
        }
    }

    // =========================================================================
    // Standard scenario
    //
    // Local ids: advertiser 1, brand 10, channel 100, audience 50.
    // Remote ids: advertiser 9001, brand 9010, channel 1000, audience 9050.
    // =========================================================================

    pub const STANDARD_REMOTE_CHANNEL: u64 = 1000;
    pub const STANDARD_MEDIA_PLAN: u64 = 700;

    /// Campaign 1 with a single placement on local channel 100 for the first
    /// week of March 2024.
    pub fn standard_campaign() -> Campaign {
        campaign(
            1,
            1,
            vec![placement(
                11,
                1,
                100,
                10,
                50,
                date_range("2024-03-01", "2024-03-07"),
            )],
        )
    }

    /// Creatives 201 and 202; only 201 exists on the platform.
    pub fn standard_creatives() -> Vec<Creative> {
        vec![creative(201, "Fizz 30s"), creative(202, "Fizz 15s")]
    }

    pub fn standard_references() -> ReferenceNames {
        ReferenceNames::default()
            .with_name(EntityKind::Advertiser, 1, "Acme Foods")
            .with_name(EntityKind::Brand, 10, "Fizz Cola")
            .with_name(EntityKind::Channel, 100, "Channel One")
            .with_name(EntityKind::TargetAudience, 50, "Adults 25-54")
    }

    /// Populate `platform` with the remote side of the standard scenario.
    pub async fn seed_standard(platform: &MockPlatform) {
        platform.add_advertiser(entity(9001, "Acme Foods")).await;
        platform.add_brand(entity(9010, "Fizz Cola")).await;
        platform.add_brand(entity(9011, "Fizz Cola Zero")).await;
        platform
            .add_channel(entity(STANDARD_REMOTE_CHANNEL, "Channel One"))
            .await;
        platform.add_target_audience(entity(9050, "Adults 25-54")).await;

        platform.add_commercial(commercial(201, "Fizz 30s")).await;
        platform.add_commercial(commercial(301, "Crunch 20s")).await;

        platform
            .add_media_plan(media_plan(
                STANDARD_MEDIA_PLAN,
                Some(date_range("2024-03-01", "2024-03-31")),
                vec![201],
            ))
            .await;

        platform
            .add_grid(booking_grid(STANDARD_REMOTE_CHANNEL, "2024-03-01", 2, 7))
            .await;
    }
}

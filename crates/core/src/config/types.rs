use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::mapping::EntityKind;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub platform: PlatformConfig,
    #[serde(default)]
    pub integration: IntegrationConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Connection settings for the broadcast sales platform.
///
/// Publish requests may carry their own copy of this section, which then
/// replaces the configured one for that request.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PlatformConfig {
    /// API base URL (e.g., "https://sales.example.tv/api/v2")
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Accepted for compatibility; requests are never retried.
    #[serde(default)]
    pub retry_count: u32,
    /// Page size for catalog listings (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Upper bound on pages fetched per catalog walk (default: 20)
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout(),
            retry_count: 0,
            page_size: default_page_size(),
            max_pages: default_max_pages(),
        }
    }
}

fn default_timeout() -> u32 {
    30
}

fn default_page_size() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    20
}

/// What to do when the platform refuses a spot.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpotFailurePolicy {
    /// Keep going and report the run as partial.
    #[default]
    Partial,
    /// Abort the run with a failed result.
    Fail,
}

/// A fixed local-to-remote id pair.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct PresetMapping {
    pub local: u64,
    pub remote: u64,
}

/// Mappings known ahead of time, seeded into every run.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PresetMappings {
    #[serde(default)]
    pub advertisers: Vec<PresetMapping>,
    #[serde(default)]
    pub brands: Vec<PresetMapping>,
    #[serde(default)]
    pub channels: Vec<PresetMapping>,
    #[serde(default)]
    pub target_audiences: Vec<PresetMapping>,
}

impl PresetMappings {
    pub fn for_kind(&self, kind: EntityKind) -> &[PresetMapping] {
        match kind {
            EntityKind::Advertiser => &self.advertisers,
            EntityKind::Brand => &self.brands,
            EntityKind::Channel => &self.channels,
            EntityKind::TargetAudience => &self.target_audiences,
        }
    }

    pub fn len(&self) -> usize {
        EntityKind::SYNC_ORDER
            .iter()
            .map(|kind| self.for_kind(*kind).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Integration pipeline settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct IntegrationConfig {
    /// Media plan spots are booked under. When unset, the first plan whose
    /// date range covers the block date is used.
    #[serde(default)]
    pub target_media_plan_id: Option<u64>,
    /// Remote channel used for placements whose channel is not mapped.
    #[serde(default)]
    pub default_channel_id: Option<u64>,
    /// Slots taken from each program release of the booking grid (default: 5)
    #[serde(default = "default_max_slots")]
    pub max_slots_per_program: usize,
    #[serde(default)]
    pub spot_failure_policy: SpotFailurePolicy,
    #[serde(default)]
    pub mappings: PresetMappings,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            target_media_plan_id: None,
            default_channel_id: None,
            max_slots_per_program: default_max_slots(),
            spot_failure_policy: SpotFailurePolicy::default(),
            mappings: PresetMappings::default(),
        }
    }
}

fn default_max_slots() -> usize {
    5
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub platform: SanitizedPlatformConfig,
    pub integration: IntegrationConfig,
}

/// Sanitized platform config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPlatformConfig {
    pub base_url: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u32,
    pub retry_count: u32,
    pub page_size: u32,
    pub max_pages: u32,
}

impl From<&PlatformConfig> for SanitizedPlatformConfig {
    fn from(platform: &PlatformConfig) -> Self {
        Self {
            base_url: platform.base_url.clone(),
            username: platform.username.clone(),
            password_configured: !platform.password.is_empty(),
            timeout_secs: platform.timeout_secs,
            retry_count: platform.retry_count,
            page_size: platform.page_size,
            max_pages: platform.max_pages,
        }
    }
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            platform: SanitizedPlatformConfig::from(&config.platform),
            integration: config.integration.clone(),
        }
    }
}

pub mod campaign;
pub mod config;
pub mod integration;
pub mod mapping;
pub mod metrics;
pub mod platform;
pub mod progress;
pub mod testing;

pub use campaign::{
    Campaign, CampaignError, CampaignStatus, Creative, DateRange, Placement, ReferenceNames,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, IntegrationConfig,
    PlatformConfig, PresetMapping, PresetMappings, SanitizedConfig, ServerConfig,
    SpotFailurePolicy,
};
pub use integration::{
    DiagnosticRequest, IntegrationError, IntegrationResult, IntegrationService, IntegrationStatus,
    ReservationOutcome, RunPhase,
};
pub use mapping::{EntityKind, IdMapping, IdentifierCache, MappingError};
pub use platform::{
    Block, BookingGrid, BroadcastPlatform, Commercial, Credentials, HttpConnector, HttpPlatform,
    ListQuery, MediaPlan, Page, PlatformConnector, PlatformError, ReferenceEntity, Session, Spot,
    SpotRequest,
};
pub use progress::{
    CallbackObserver, NoopObserver, ProgressEntry, ProgressLog, ProgressObserver, TracingObserver,
};

//! Campaign publishing pipeline.
//!
//! [`IntegrationService`] pushes one campaign to the broadcast platform:
//! - **Authenticate**: open a platform session
//! - **Sync dictionaries**: map advertisers, brands, channels and audiences
//! - **Find blocks**: read the booking grid for each placement
//! - **Map commercials**: match creatives to remote commercials
//! - **Reserve spots**: attach a commercial to one block per placement
//!
//! Each request gets its own service; nothing is shared between runs.

mod diagnostics;
mod service;
mod types;

pub use diagnostics::DiagnosticRequest;
pub use service::IntegrationService;
pub use types::{
    IntegrationError, IntegrationResult, IntegrationStatus, ReservationOutcome, RunPhase,
};

//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Integration runs (outcome, duration, spots reserved)
//! - Platform requests (per operation and outcome)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Integration Runs
// =============================================================================

/// Integration runs by final status.
pub static INTEGRATION_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("spotsync_integration_runs_total", "Total integration runs"),
        &["status"], // "complete", "partial", "failed"
    )
    .unwrap()
});

/// Integration run duration in seconds.
pub static INTEGRATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "spotsync_integration_duration_seconds",
            "Duration of an integration run",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["status"],
    )
    .unwrap()
});

/// Failed runs by the phase they failed in.
pub static INTEGRATION_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "spotsync_integration_failures_total",
            "Integration runs that failed, by phase",
        ),
        &["phase"],
    )
    .unwrap()
});

/// Spots reserved on the platform.
pub static SPOTS_RESERVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "spotsync_spots_reserved_total",
        "Total spots attached to blocks",
    )
    .unwrap()
});

/// Spot attachments the platform refused.
pub static SPOT_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "spotsync_spot_failures_total",
        "Total spot attachments refused by the platform",
    )
    .unwrap()
});

// =============================================================================
// Platform Requests
// =============================================================================

/// Platform requests by operation and outcome.
pub static PLATFORM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "spotsync_platform_requests_total",
            "Total requests issued to the broadcast platform",
        ),
        &["operation", "outcome"], // outcome: "ok", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Integration runs
        Box::new(INTEGRATION_RUNS.clone()),
        Box::new(INTEGRATION_DURATION.clone()),
        Box::new(INTEGRATION_FAILURES.clone()),
        Box::new(SPOTS_RESERVED.clone()),
        Box::new(SPOT_FAILURES.clone()),
        // Platform
        Box::new(PLATFORM_REQUESTS.clone()),
    ]
}

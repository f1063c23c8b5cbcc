//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Tracking state machine (transitions, rejected actions)
//! - Lookup attempts (results, duration, stale completions)
//! - Presenter failures

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// State Machine Metrics
// =============================================================================

/// Accepted transitions.
pub static TRACKING_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "waybill_tracking_transitions_total",
            "Accepted tracking state transitions",
        ),
        &["from_state", "to_state"],
    )
    .unwrap()
});

/// Actions rejected by the transition table.
pub static REJECTED_ACTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "waybill_tracking_rejected_actions_total",
            "Actions not valid for the current tracking state",
        ),
        &["state", "action"],
    )
    .unwrap()
});

/// Presenter render failures.
pub static PRESENTER_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "waybill_presenter_failures_total",
        "Render calls that failed after a transition",
    )
    .unwrap()
});

// =============================================================================
// Lookup Metrics
// =============================================================================

/// Settled lookup attempts by result.
pub static LOOKUP_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("waybill_lookup_attempts_total", "Settled lookup attempts"),
        &["result"], // "success", "late_success", "invalid_format", "not_found", ...
    )
    .unwrap()
});

/// Lookup attempt duration in seconds.
pub static LOOKUP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "waybill_lookup_duration_seconds",
            "Duration of a single lookup attempt",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["service"],
    )
    .unwrap()
});

/// Completions discarded because their attempt was superseded.
pub static STALE_LOOKUPS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "waybill_stale_lookups_total",
        "Lookup results discarded after the attempt was superseded",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TRACKING_TRANSITIONS.clone()),
        Box::new(REJECTED_ACTIONS.clone()),
        Box::new(PRESENTER_FAILURES.clone()),
        Box::new(LOOKUP_ATTEMPTS.clone()),
        Box::new(LOOKUP_DURATION.clone()),
        Box::new(STALE_LOOKUPS.clone()),
    ]
}

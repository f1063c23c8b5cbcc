//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the waybill server:
//! - HTTP request metrics (latency, counts)
//! - WebSocket connection and frame metrics
//! - Current tracking state (collected dynamically)
//!
//! Core metrics (transitions, lookups) are registered from `waybill_core::metrics`.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};
use tracing::error;
use waybill_core::TrackingState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "waybill_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("waybill_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "waybill_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

/// Active WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "waybill_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

/// Total WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "waybill_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// WebSocket messages sent by type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("waybill_ws_messages_sent_total", "WebSocket messages sent"),
        &["type"],
    )
    .unwrap()
});

/// WebSocket lag events (when client falls behind).
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "waybill_ws_lag_events_total",
        "WebSocket lag events (client fell behind)",
    )
    .unwrap()
});

/// Render calls that produced the same view as the previous frame.
pub static RENDER_FRAMES_DEDUPLICATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "waybill_render_frames_deduplicated_total",
        "Render calls skipped because the view did not change",
    )
    .unwrap()
});

// =============================================================================
// Tracking Metrics (collected dynamically)
// =============================================================================

/// Current tracking state (1 for the active state, 0 otherwise).
pub static TRACKING_CURRENT_STATE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("waybill_tracking_state", "Current tracking state"),
        &["state"],
    )
    .unwrap()
});

/// Failed attempts in the current session.
pub static TRACKING_RETRY_COUNT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "waybill_tracking_retry_count",
        "Failed lookup attempts since the last clear",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // WebSocket
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_MESSAGES_SENT.clone()))
        .unwrap();
    registry.register(Box::new(WS_LAG_EVENTS.clone())).unwrap();
    registry
        .register(Box::new(RENDER_FRAMES_DEDUPLICATED.clone()))
        .unwrap();

    // Tracking
    registry
        .register(Box::new(TRACKING_CURRENT_STATE.clone()))
        .unwrap();
    registry
        .register(Box::new(TRACKING_RETRY_COUNT.clone()))
        .unwrap();

    // Core metrics (state machine, lookups, presenter)
    for metric in waybill_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the tracking gauges reflect the live session.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let Ok(snapshot) = state.tracking().snapshot().await else {
        return;
    };

    for tracking_state in TrackingState::ALL {
        let active = if tracking_state == snapshot.state { 1 } else { 0 };
        TRACKING_CURRENT_STATE
            .with_label_values(&[tracking_state.as_str()])
            .set(active);
    }
    TRACKING_RETRY_COUNT.set(snapshot.context.retry_count as i64);
}

/// Normalize a path for metric labels.
///
/// API routes are fixed; everything else is served from the widget directory
/// and collapses into one label.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with("/api/") {
        path.trim_end_matches('/').to_string()
    } else {
        "/static".to_string()
    }
}

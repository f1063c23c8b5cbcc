//! Tracking widget API handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use waybill_core::{TrackingError, TrackingSnapshot, TrackingState, TrackingView};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting a waybill number
#[derive(Debug, Deserialize)]
pub struct TrackBody {
    pub identifier: String,
}

/// Snapshot of the session plus the view the widget should show
#[derive(Debug, Serialize)]
pub struct TrackingResponse {
    #[serde(flatten)]
    pub snapshot: TrackingSnapshot,
    pub view: TrackingView,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct TrackingErrorResponse {
    pub error: String,
    /// State that rejected the action, if the action was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<TrackingState>,
}

type ApiResult = Result<Json<TrackingResponse>, (StatusCode, Json<TrackingErrorResponse>)>;

fn respond(state: &AppState, snapshot: TrackingSnapshot) -> Json<TrackingResponse> {
    let view = TrackingView::project(snapshot.state, &snapshot.context, state.view_config());
    Json(TrackingResponse { snapshot, view })
}

fn error_response(e: TrackingError) -> (StatusCode, Json<TrackingErrorResponse>) {
    let (status, state) = match &e {
        TrackingError::InvalidAction { state, .. } => (StatusCode::CONFLICT, Some(*state)),
        TrackingError::EmptyIdentifier => (StatusCode::BAD_REQUEST, None),
        TrackingError::RunnerClosed => (StatusCode::SERVICE_UNAVAILABLE, None),
        TrackingError::MissingRecord | TrackingError::StaleLookup { .. } => {
            error!("Unexpected tracking error from action endpoint: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, None)
        }
    };
    debug!(status = %status, "Tracking action refused: {}", e);

    (
        status,
        Json(TrackingErrorResponse {
            error: e.to_string(),
            state,
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Current state, context and view
pub async fn get_tracking(State(state): State<Arc<AppState>>) -> ApiResult {
    let snapshot = state.tracking().snapshot().await.map_err(error_response)?;
    Ok(respond(&state, snapshot))
}

/// Submit a waybill number
pub async fn track(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TrackBody>,
) -> ApiResult {
    let snapshot = state
        .tracking()
        .track(body.identifier)
        .await
        .map_err(error_response)?;
    Ok(respond(&state, snapshot))
}

/// Re-attempt the last lookup
pub async fn retry(State(state): State<Arc<AppState>>) -> ApiResult {
    let snapshot = state.tracking().retry().await.map_err(error_response)?;
    Ok(respond(&state, snapshot))
}

/// Reset the widget
pub async fn clear(State(state): State<Arc<AppState>>) -> ApiResult {
    let snapshot = state.tracking().clear().await.map_err(error_response)?;
    Ok(respond(&state, snapshot))
}

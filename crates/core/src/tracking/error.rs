//! Error types for the tracking module.

use thiserror::Error;

use super::identifier::WAYBILL_EXAMPLE;
use super::state::{TrackingAction, TrackingState};

/// Errors reported by the tracking controller and its handle.
///
/// None of these leave the machine in an inconsistent state; lookup failures
/// are not in here because they are absorbed into state + `last_error`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackingError {
    /// The action has no entry in the transition table for this state.
    #[error("Invalid transition from {state} with action {action}")]
    InvalidAction {
        state: TrackingState,
        action: TrackingAction,
    },

    /// A `success` transition was dispatched without a shipment record.
    #[error("Success transition requires a shipment record")]
    MissingRecord,

    /// Submit was pressed with nothing in the input.
    #[error("Tracking number is required")]
    EmptyIdentifier,

    /// A lookup settled after its attempt was superseded.
    #[error("Discarded result of superseded lookup attempt {generation}")]
    StaleLookup { generation: u64 },

    /// The runner task is gone.
    #[error("Tracking runner is not running")]
    RunnerClosed,
}

impl TrackingError {
    /// Errors the user never sees; they only show up in diagnostics.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::InvalidAction { .. } | Self::StaleLookup { .. })
    }
}

/// Failure of a single lookup attempt. Every variant counts toward the retry budget.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// Identifier does not match the waybill format.
    #[error("Invalid waybill format: {0:?} (expected e.g. {example})", example = WAYBILL_EXAMPLE)]
    InvalidFormat(String),

    /// No shipment with this identifier.
    #[error("Shipment not found: {0}")]
    NotFound(String),

    /// Backend could not be reached or returned garbage.
    #[error("Tracking service unavailable: {0}")]
    Unavailable(String),

    /// The attempt ran past the configured wall-clock deadline.
    #[error("Lookup exceeded deadline of {0} ms")]
    DeadlineExceeded(u64),
}

impl LookupError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidFormat(_))
    }

    /// Label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) => "invalid_format",
            Self::NotFound(_) => "not_found",
            Self::Unavailable(_) => "unavailable",
            Self::DeadlineExceeded(_) => "deadline_exceeded",
        }
    }
}

/// Failure while projecting a state onto the UI.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PresenterError {
    /// The UI surface is gone (e.g., no listener).
    #[error("Presenter unavailable: {0}")]
    Unavailable(String),

    #[error("Render failed: {0}")]
    Render(String),
}

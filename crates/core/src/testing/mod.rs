//! Testing utilities and mock implementations.
//!
//! This module provides mock collaborators for the tracking controller, so
//! hosts and integration tests can drive a session without a real carrier
//! backend or UI.
//!
//! # Example
//!
//! ```rust,ignore
//! use waybill_core::testing::{MockLookupService, RecordingPresenter};
//!
//! let lookup = Arc::new(MockLookupService::new());
//! let presenter = Arc::new(RecordingPresenter::new());
//!
//! // Configure mock responses
//! lookup.set_failure(Some(LookupError::Unavailable("down".into()))).await;
//!
//! // Build a controller and runner around them...
//! ```

mod mock_lookup;
mod recording_presenter;

pub use mock_lookup::MockLookupService;
pub use recording_presenter::{RecordedFrame, RecordingPresenter};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::lookup::SimulatedLookup;
    use crate::tracking::{TrackingContext, ShipmentRecord};

    /// The sample sea-freight shipment, with the given identifier.
    pub fn shipment(identifier: &str) -> ShipmentRecord {
        SimulatedLookup::sample_record(identifier)
    }

    /// A context that has spent `retry_count` of `max_retries` attempts.
    pub fn failed_context(identifier: &str, retry_count: u32, max_retries: u32) -> TrackingContext {
        let mut context = TrackingContext::new(max_retries);
        context.identifier = identifier.to_string();
        context.retry_count = retry_count.min(max_retries);
        context.last_error = Some(format!("Shipment not found: {}", identifier));
        context
    }
}

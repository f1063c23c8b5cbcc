//! Shipment tracking state machine and its orchestration.

mod controller;
mod error;
mod identifier;
mod runner;
mod state;
mod traits;
mod types;
mod view;

pub use controller::{LookupRequest, TrackingController, TrackingSnapshot};
pub use error::{LookupError, PresenterError, TrackingError};
pub use identifier::{
    is_valid_identifier, normalize_identifier, validate_identifier, WAYBILL_EXAMPLE,
};
pub use runner::{create_tracking_runner, run_attempt, LookupOutcome, TrackingHandle, TrackingRunner};
pub use state::{TrackingAction, TrackingState};
pub use traits::{LookupService, Presenter};
pub use types::{
    progress_percent, Checkpoint, ContextPatch, ShipmentMode, ShipmentRecord, TrackingContext,
};
pub use view::{CheckpointLine, Milestone, Panels, TrackingView, ViewConfig};

pub mod config;
pub mod lookup;
pub mod metrics;
pub mod testing;
pub mod tracking;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LookupBackend,
    SanitizedConfig,
};
pub use lookup::{create_lookup_service, lookup_deadline, SimulatedLookup};
pub use tracking::{
    create_tracking_runner, Checkpoint, ContextPatch, LookupError, LookupService, Presenter,
    PresenterError, ShipmentMode, ShipmentRecord, TrackingAction, TrackingContext,
    TrackingController, TrackingError, TrackingHandle, TrackingRunner, TrackingSnapshot,
    TrackingState, TrackingView, ViewConfig,
};

use waybill_core::{Config, SanitizedConfig, TrackingHandle, ViewConfig};

use crate::api::WsBroadcaster;

/// Shared application state
pub struct AppState {
    config: Config,
    view_config: ViewConfig,
    tracking: TrackingHandle,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(config: Config, tracking: TrackingHandle, ws_broadcaster: WsBroadcaster) -> Self {
        let view_config = ViewConfig::from(&config.tracking);
        Self {
            config,
            view_config,
            tracking,
            ws_broadcaster,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn view_config(&self) -> &ViewConfig {
        &self.view_config
    }

    pub fn tracking(&self) -> &TrackingHandle {
        &self.tracking
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}

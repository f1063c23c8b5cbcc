//! Lookup service backends.

mod simulated;

pub use simulated::SimulatedLookup;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{LookupBackend, LookupConfig};
use crate::tracking::LookupService;

/// Factory function to create the lookup service from config
pub fn create_lookup_service(config: &LookupConfig) -> Arc<dyn LookupService> {
    match config.backend {
        LookupBackend::Simulated => Arc::new(SimulatedLookup::from_config(config)),
    }
}

/// Per-attempt deadline from config.
pub fn lookup_deadline(config: &LookupConfig) -> Option<Duration> {
    config.deadline_ms.map(Duration::from_millis)
}

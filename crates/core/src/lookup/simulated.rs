use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use crate::config::LookupConfig;
use crate::tracking::{
    Checkpoint, LookupError, LookupService, ShipmentMode, ShipmentRecord,
};

/// Stand-in carrier backend.
///
/// Waits for a fixed delay, then answers every identifier with the same
/// sea-freight sample shipment. Identifiers listed as unknown get `NotFound`.
#[derive(Debug, Clone)]
pub struct SimulatedLookup {
    delay: Duration,
    not_found: HashSet<String>,
}

impl SimulatedLookup {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            not_found: HashSet::new(),
        }
    }

    pub fn from_config(config: &LookupConfig) -> Self {
        Self::new(Duration::from_millis(config.simulated_delay_ms))
            .with_not_found(config.simulated_not_found.iter().cloned())
    }

    /// Report these identifiers as unknown.
    pub fn with_not_found(mut self, identifiers: impl IntoIterator<Item = String>) -> Self {
        self.not_found.extend(identifiers);
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The sample shipment returned for `identifier`.
    pub fn sample_record(identifier: &str) -> ShipmentRecord {
        ShipmentRecord::new(
            identifier,
            "In Transit",
            date(2025, 8, 5),
            "Port of Singapore, 2025-07-24 09:15 UTC",
            "MSK-V12345",
            "Shanghai, China",
            "Los Angeles, CA",
            "Maersk",
            ShipmentMode::SeaFreight,
        )
        .with_checkpoints([
            Checkpoint::new(
                "Booked",
                date(2025, 7, 20),
                "Shanghai, China",
                "Shipment booked and processed.",
            ),
            Checkpoint::new(
                "In Transit",
                date(2025, 7, 24),
                "Port of Singapore",
                "Shipment arrived at intermediate port.",
            ),
        ])
    }
}

impl Default for SimulatedLookup {
    fn default() -> Self {
        Self::from_config(&LookupConfig::default())
    }
}

#[async_trait]
impl LookupService for SimulatedLookup {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn lookup(&self, identifier: &str) -> Result<ShipmentRecord, LookupError> {
        debug!(identifier, delay_ms = self.delay.as_millis() as u64, "Simulated lookup");
        tokio::time::sleep(self.delay).await;

        if self.not_found.contains(identifier) {
            return Err(LookupError::NotFound(identifier.to_string()));
        }
        Ok(Self::sample_record(identifier))
    }
}

// Constant dates; every value is a valid calendar day.
fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

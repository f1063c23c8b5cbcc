//! Shipment records and the mutable tracking context.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Shipment Record Types
// ============================================================================

/// Transport mode of a shipment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentMode {
    AirFreight,
    SeaFreight,
    LandTransport,
    Multimodal,
}

impl ShipmentMode {
    /// Label shown in the shipment details panel.
    pub fn label(&self) -> &'static str {
        match self {
            ShipmentMode::AirFreight => "Air Freight",
            ShipmentMode::SeaFreight => "Sea Freight",
            ShipmentMode::LandTransport => "Land Transport",
            ShipmentMode::Multimodal => "Multimodal",
        }
    }
}

/// A single scan event on the shipment timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Checkpoint {
    /// Milestone label (e.g., "Booked", "In Transit").
    pub status: String,
    pub date: NaiveDate,
    pub location: String,
    /// Free-text description.
    pub details: String,
}

impl Checkpoint {
    pub fn new(
        status: impl Into<String>,
        date: NaiveDate,
        location: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            status: status.into(),
            date,
            location: location.into(),
            details: details.into(),
        }
    }
}

/// Snapshot returned by a successful lookup.
///
/// Records are never edited after the lookup returns them; the controller
/// only ever swaps the whole record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShipmentRecord {
    pub identifier: String,
    pub status: String,
    pub estimated_arrival: NaiveDate,
    pub last_checkpoint: String,
    pub carrier_reference: String,
    pub origin: String,
    pub destination: String,
    pub carrier: String,
    pub mode: ShipmentMode,
    /// Ordered by occurrence, oldest first.
    #[serde(default)]
    checkpoints: Vec<Checkpoint>,
}

impl ShipmentRecord {
    /// Create a record with no checkpoints yet.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identifier: impl Into<String>,
        status: impl Into<String>,
        estimated_arrival: NaiveDate,
        last_checkpoint: impl Into<String>,
        carrier_reference: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        carrier: impl Into<String>,
        mode: ShipmentMode,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            status: status.into(),
            estimated_arrival,
            last_checkpoint: last_checkpoint.into(),
            carrier_reference: carrier_reference.into(),
            origin: origin.into(),
            destination: destination.into(),
            carrier: carrier.into(),
            mode,
            checkpoints: Vec::new(),
        }
    }

    /// Append checkpoints to the end of the timeline.
    ///
    /// Callers supply them in occurrence order; the timeline is append-only.
    pub fn with_checkpoints(mut self, checkpoints: impl IntoIterator<Item = Checkpoint>) -> Self {
        self.checkpoints.extend(checkpoints);
        self
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    /// Whether any checkpoint carries the given milestone label.
    pub fn has_checkpoint(&self, status: &str) -> bool {
        self.checkpoints
            .iter()
            .any(|cp| cp.status == status)
    }

    /// Completion percentage for the progress bar.
    pub fn progress_percent(&self, expected_checkpoints: u32) -> u8 {
        progress_percent(self.checkpoints.len(), expected_checkpoints)
    }
}

/// `min(100, count / target * 100)`. A target of 0 reports 0.
pub fn progress_percent(checkpoint_count: usize, expected_checkpoints: u32) -> u8 {
    if expected_checkpoints == 0 {
        return 0;
    }
    let pct = checkpoint_count.saturating_mul(100) / expected_checkpoints as usize;
    pct.min(100) as u8
}

// ============================================================================
// Tracking Context
// ============================================================================

/// Mutable record owned by the controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackingContext {
    /// Last submitted tracking code, empty when idle.
    pub identifier: String,
    /// Present only while the machine is in `success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<ShipmentRecord>,
    /// Reason of the last failed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Failed attempts since the last clear, saturated at `max_retries`.
    pub retry_count: u32,
    pub max_retries: u32,
    /// Set once the user retries from `timeout`.
    #[serde(default)]
    pub exhaustion_acknowledged: bool,
}

impl TrackingContext {
    pub fn new(max_retries: u32) -> Self {
        Self {
            identifier: String::new(),
            record: None,
            last_error: None,
            retry_count: 0,
            max_retries,
            exhaustion_acknowledged: false,
        }
    }

    /// Reset every field except the policy constant.
    pub fn reset(&mut self) {
        *self = Self::new(self.max_retries);
    }

    pub fn retries_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }

    pub fn retries_remaining(&self) -> u32 {
        self.max_retries.saturating_sub(self.retry_count)
    }

    /// Shallow merge: every field set on the patch overwrites the context.
    pub fn apply(&mut self, patch: ContextPatch) {
        if let Some(identifier) = patch.identifier {
            self.identifier = identifier;
        }
        if let Some(record) = patch.record {
            self.record = record;
        }
        if let Some(last_error) = patch.last_error {
            self.last_error = last_error;
        }
        if let Some(retry_count) = patch.retry_count {
            self.retry_count = retry_count;
        }
        if let Some(acknowledged) = patch.exhaustion_acknowledged {
            self.exhaustion_acknowledged = acknowledged;
        }
        self.retry_count = self.retry_count.min(self.max_retries);
    }
}

/// Payload merged into the context on an accepted transition.
///
/// `max_retries` is deliberately absent: the policy is not mutable at runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextPatch {
    pub identifier: Option<String>,
    pub record: Option<Option<ShipmentRecord>>,
    pub last_error: Option<Option<String>>,
    pub retry_count: Option<u32>,
    pub exhaustion_acknowledged: Option<bool>,
}

impl ContextPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch that restores a freshly created context.
    pub fn reset() -> Self {
        Self {
            identifier: Some(String::new()),
            record: Some(None),
            last_error: Some(None),
            retry_count: Some(0),
            exhaustion_acknowledged: Some(false),
        }
    }

    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn record(mut self, record: ShipmentRecord) -> Self {
        self.record = Some(Some(record));
        self
    }

    pub fn clear_record(mut self) -> Self {
        self.record = Some(None);
        self
    }

    pub fn last_error(mut self, reason: impl Into<String>) -> Self {
        self.last_error = Some(Some(reason.into()));
        self
    }

    pub fn clear_last_error(mut self) -> Self {
        self.last_error = Some(None);
        self
    }

    pub fn retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    pub fn exhaustion_acknowledged(mut self, acknowledged: bool) -> Self {
        self.exhaustion_acknowledged = Some(acknowledged);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

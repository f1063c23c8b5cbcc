//! Pure projection of state + context onto what the widget displays.

use serde::Serialize;

use crate::config::TrackingConfig;

use super::state::TrackingState;
use super::types::{progress_percent, ShipmentRecord, TrackingContext};

/// Display settings that are not part of the machine itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    pub expected_checkpoints: u32,
    pub milestones: Vec<String>,
}

impl From<&TrackingConfig> for ViewConfig {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            expected_checkpoints: config.expected_checkpoints,
            milestones: config.milestones.clone(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self::from(&TrackingConfig::default())
    }
}

/// Which parts of the widget are visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Panels {
    pub result: bool,
    pub error: bool,
    pub timeout: bool,
    pub loading: bool,
    pub clear_button: bool,
}

impl Panels {
    pub fn for_state(state: TrackingState) -> Self {
        match state {
            TrackingState::Idle => Self::default(),
            TrackingState::Loading => Self {
                loading: true,
                ..Self::default()
            },
            TrackingState::Success => Self {
                result: true,
                clear_button: true,
                ..Self::default()
            },
            TrackingState::Error => Self {
                error: true,
                ..Self::default()
            },
            TrackingState::Timeout => Self {
                timeout: true,
                ..Self::default()
            },
        }
    }
}

/// One entry of the checkpoint timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointLine {
    pub status: String,
    /// `"<date> - <location>"`
    pub when: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub label: String,
    pub reached: bool,
}

/// Everything a surface needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingView {
    pub state: TrackingState,
    pub panels: Panels,
    /// Value to put back into the input box.
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipment: Option<ShipmentRecord>,
    pub checkpoints: Vec<CheckpointLine>,
    pub milestones: Vec<Milestone>,
    pub progress_percent: u8,
    pub retries_remaining: u32,
}

impl TrackingView {
    pub fn project(state: TrackingState, context: &TrackingContext, config: &ViewConfig) -> Self {
        let shipment = match state {
            TrackingState::Success => context.record.clone(),
            _ => None,
        };

        let checkpoints = shipment
            .as_ref()
            .map(|record| {
                record
                    .checkpoints()
                    .iter()
                    .map(|cp| CheckpointLine {
                        status: cp.status.clone(),
                        when: format!("{} - {}", cp.date, cp.location),
                        details: cp.details.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let milestones = config
            .milestones
            .iter()
            .map(|label| Milestone {
                label: label.clone(),
                reached: shipment
                    .as_ref()
                    .is_some_and(|record| record.has_checkpoint(label)),
            })
            .collect();

        let progress = shipment
            .as_ref()
            .map(|record| progress_percent(record.checkpoint_count(), config.expected_checkpoints))
            .unwrap_or(0);

        Self {
            state,
            panels: Panels::for_state(state),
            input: context.identifier.clone(),
            message: message_for(state, context),
            shipment,
            checkpoints,
            milestones,
            progress_percent: progress,
            retries_remaining: context.retries_remaining(),
        }
    }
}

fn message_for(state: TrackingState, context: &TrackingContext) -> Option<String> {
    match state {
        TrackingState::Error => Some(
            context
                .last_error
                .clone()
                .unwrap_or_else(|| "Lookup failed. Please try again.".to_string()),
        ),
        TrackingState::Timeout => Some(format!(
            "Retries exhausted ({} of {}). Retry or clear to start over.",
            context.retry_count, context.max_retries
        )),
        TrackingState::Idle | TrackingState::Loading | TrackingState::Success => None,
    }
}

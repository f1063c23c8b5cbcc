use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Tracking state machine policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TrackingConfig {
    /// Failed attempts allowed before the machine escalates to `timeout`.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Checkpoint count that represents a fully delivered shipment.
    /// Only used for the progress bar.
    #[serde(default = "default_expected_checkpoints")]
    pub expected_checkpoints: u32,

    /// Ordered timeline milestones highlighted by the widget.
    #[serde(default = "default_milestones")]
    pub milestones: Vec<String>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_expected_checkpoints() -> u32 {
    5
}

fn default_milestones() -> Vec<String> {
    ["Booked", "Picked Up", "In Transit", "Customs", "Delivered"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            expected_checkpoints: default_expected_checkpoints(),
            milestones: default_milestones(),
        }
    }
}

/// Available lookup backends
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LookupBackend {
    #[default]
    Simulated,
    // Future: Http
}

/// Shipment lookup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LookupConfig {
    #[serde(default)]
    pub backend: LookupBackend,

    /// Artificial latency of the simulated backend (milliseconds).
    #[serde(default = "default_simulated_delay")]
    pub simulated_delay_ms: u64,

    /// Wall-clock deadline per attempt (milliseconds).
    /// An attempt that exceeds it counts as a failed attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,

    /// Identifiers the simulated backend reports as unknown.
    #[serde(default)]
    pub simulated_not_found: Vec<String>,
}

fn default_simulated_delay() -> u64 {
    1000
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            backend: LookupBackend::default(),
            simulated_delay_ms: default_simulated_delay(),
            deadline_ms: None,
            simulated_not_found: Vec::new(),
        }
    }
}

/// Tracking runner channel sizes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunnerConfig {
    /// Capacity of the command queue feeding the controller task.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,

    /// Capacity of the render frame broadcast channel.
    #[serde(default = "default_frame_buffer")]
    pub frame_buffer: usize,
}

fn default_command_buffer() -> usize {
    64
}

fn default_frame_buffer() -> usize {
    256
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command_buffer: default_command_buffer(),
            frame_buffer: default_frame_buffer(),
        }
    }
}

/// Sanitized config for API responses.
///
/// Nothing in the config is secret yet, but the server only ever exposes this
/// projection so new fields are opt-in.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub tracking: TrackingConfig,
    pub lookup: SanitizedLookupConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedLookupConfig {
    pub backend: LookupBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            tracking: config.tracking.clone(),
            lookup: SanitizedLookupConfig {
                backend: config.lookup.backend,
                deadline_ms: config.lookup.deadline_ms,
            },
        }
    }
}

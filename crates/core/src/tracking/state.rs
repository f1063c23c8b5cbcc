//! Tracking states, actions and the transition table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// UI state of the tracking widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    /// Nothing submitted (initial state).
    #[default]
    Idle,
    /// A lookup attempt is in flight.
    Loading,
    /// The last attempt produced a shipment record.
    Success,
    /// The last attempt failed and the retry budget is not spent.
    Error,
    /// The retry budget is spent. This is retry exhaustion, not a deadline.
    Timeout,
}

/// Actions accepted by [`TrackingState::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingAction {
    Track,
    Success,
    Error,
    Timeout,
    Retry,
    Clear,
}

impl TrackingAction {
    /// Every action, in table column order.
    pub const ALL: [TrackingAction; 6] = [
        TrackingAction::Track,
        TrackingAction::Success,
        TrackingAction::Error,
        TrackingAction::Timeout,
        TrackingAction::Retry,
        TrackingAction::Clear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Success => "success",
            Self::Error => "error",
            Self::Timeout => "timeout",
            Self::Retry => "retry",
            Self::Clear => "clear",
        }
    }
}

impl TrackingState {
    /// Every state, in table row order.
    pub const ALL: [TrackingState; 5] = [
        TrackingState::Idle,
        TrackingState::Loading,
        TrackingState::Success,
        TrackingState::Error,
        TrackingState::Timeout,
    ];

    /// Transition table. `None` means the action is rejected in this state.
    pub fn next(self, action: TrackingAction) -> Option<TrackingState> {
        use TrackingAction as A;
        use TrackingState as S;

        match (self, action) {
            (S::Idle, A::Track) => Some(S::Loading),
            (S::Idle, A::Clear) => Some(S::Idle),

            (S::Loading, A::Success) => Some(S::Success),
            (S::Loading, A::Error) => Some(S::Error),
            (S::Loading, A::Timeout) => Some(S::Timeout),
            // Cancels the in-flight attempt.
            (S::Loading, A::Clear) => Some(S::Idle),

            (S::Success | S::Error | S::Timeout, A::Retry) => Some(S::Loading),
            (S::Success | S::Error | S::Timeout, A::Clear) => Some(S::Idle),

            (S::Idle, A::Success | A::Error | A::Timeout | A::Retry)
            | (S::Loading, A::Track | A::Retry)
            | (S::Success | S::Error | S::Timeout, A::Track | A::Success | A::Error | A::Timeout) => {
                None
            }
        }
    }

    pub fn accepts(self, action: TrackingAction) -> bool {
        self.next(action).is_some()
    }

    /// Actions the table accepts from this state.
    pub fn allowed_actions(self) -> Vec<TrackingAction> {
        TrackingAction::ALL
            .into_iter()
            .filter(|action| self.accepts(*action))
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
            Self::Timeout => "timeout",
        }
    }

    /// Whether a retry is offered to the user.
    pub fn can_retry(&self) -> bool {
        self.accepts(TrackingAction::Retry)
    }
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TrackingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TrackingState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "loading" => Ok(Self::Loading),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            "timeout" => Ok(Self::Timeout),
            _ => Err(format!("Invalid tracking state: {s}")),
        }
    }
}

impl std::str::FromStr for TrackingAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "track" => Ok(Self::Track),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            "timeout" => Ok(Self::Timeout),
            "retry" => Ok(Self::Retry),
            "clear" => Ok(Self::Clear),
            _ => Err(format!("Invalid tracking action: {s}")),
        }
    }
}

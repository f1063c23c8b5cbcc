//! The tracking controller: state, context and lookup bookkeeping.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::TrackingConfig;
use crate::metrics::{
    LOOKUP_ATTEMPTS, PRESENTER_FAILURES, REJECTED_ACTIONS, STALE_LOOKUPS, TRACKING_TRANSITIONS,
};

use super::error::{LookupError, TrackingError};
use super::identifier::normalize_identifier;
use super::runner::run_attempt;
use super::state::{TrackingAction, TrackingState};
use super::traits::{LookupService, Presenter};
use super::types::{ContextPatch, ShipmentRecord, TrackingContext};

/// A lookup attempt the controller is waiting on.
///
/// Issued every time the machine enters `loading`. Only a result carrying the
/// same generation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupRequest {
    pub generation: u64,
    pub identifier: String,
    /// State the machine was in when the attempt was issued.
    pub origin: TrackingState,
}

/// Read-only view of the controller for hosts and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingSnapshot {
    pub session_id: Uuid,
    pub state: TrackingState,
    pub context: TrackingContext,
    pub generation: u64,
    pub lookup_pending: bool,
    pub allowed_actions: Vec<TrackingAction>,
}

/// Owns the tracking state machine of one widget session.
///
/// All mutation goes through [`dispatch`](Self::dispatch). The lookup itself
/// runs elsewhere (see [`TrackingRunner`](super::TrackingRunner)); its outcome
/// comes back through [`settle`](Self::settle).
pub struct TrackingController {
    session_id: Uuid,
    state: TrackingState,
    context: TrackingContext,
    presenter: Arc<dyn Presenter>,
    generation: u64,
    pending: Option<LookupRequest>,
}

impl std::fmt::Debug for TrackingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingController")
            .field("session_id", &self.session_id)
            .field("state", &self.state)
            .field("context", &self.context)
            .field("generation", &self.generation)
            .field("pending", &self.pending)
            .field("presenter", &"<presenter>")
            .finish()
    }
}

impl TrackingController {
    /// Create a controller in `idle` with a fresh context.
    pub fn new(config: &TrackingConfig, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: TrackingState::Idle,
            context: TrackingContext::new(config.max_retries),
            presenter,
            generation: 0,
            pending: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn context(&self) -> &TrackingContext {
        &self.context
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The attempt the machine is waiting on, if any.
    pub fn pending_lookup(&self) -> Option<&LookupRequest> {
        self.pending.as_ref()
    }

    pub fn snapshot(&self) -> TrackingSnapshot {
        TrackingSnapshot {
            session_id: self.session_id,
            state: self.state,
            context: self.context.clone(),
            generation: self.generation,
            lookup_pending: self.pending.is_some(),
            allowed_actions: self.state.allowed_actions(),
        }
    }

    /// Apply an action with its payload.
    ///
    /// On an accepted transition the patch is merged into the context, the
    /// state changes, and the presenter is called. A rejected action leaves
    /// everything untouched and is reported through logs and metrics.
    ///
    /// `success` must carry a record; `record` is dropped on every other state.
    pub fn dispatch(
        &mut self,
        action: TrackingAction,
        patch: ContextPatch,
    ) -> Result<TrackingState, TrackingError> {
        let from = self.state;
        let Some(next) = from.next(action) else {
            warn!(
                session = %self.session_id,
                "Invalid transition from {} with action {}",
                from,
                action
            );
            REJECTED_ACTIONS
                .with_label_values(&[from.as_str(), action.as_str()])
                .inc();
            return Err(TrackingError::InvalidAction {
                state: from,
                action,
            });
        };

        let mut context = self.context.clone();
        context.apply(patch);
        if next == TrackingState::Success && context.record.is_none() {
            warn!(session = %self.session_id, "Refusing success transition without a record");
            REJECTED_ACTIONS
                .with_label_values(&[from.as_str(), action.as_str()])
                .inc();
            return Err(TrackingError::MissingRecord);
        }
        if next != TrackingState::Success {
            context.record = None;
        }

        self.context = context;
        self.state = next;
        self.pending = None;
        if next == TrackingState::Loading {
            self.generation += 1;
            self.pending = Some(LookupRequest {
                generation: self.generation,
                identifier: self.context.identifier.clone(),
                origin: from,
            });
        }

        TRACKING_TRANSITIONS
            .with_label_values(&[from.as_str(), next.as_str()])
            .inc();
        debug!(
            session = %self.session_id,
            from = %from,
            to = %next,
            action = %action,
            retry_count = self.context.retry_count,
            "Tracking transition"
        );

        self.present();
        Ok(next)
    }

    /// Submit a waybill number. Whitespace is trimmed; empty input is refused
    /// without touching the machine.
    pub fn track(&mut self, raw_identifier: &str) -> Result<TrackingState, TrackingError> {
        let identifier = normalize_identifier(raw_identifier);
        if identifier.is_empty() {
            debug!(session = %self.session_id, "Refusing to track an empty identifier");
            return Err(TrackingError::EmptyIdentifier);
        }

        info!(session = %self.session_id, identifier, "Tracking shipment");
        self.dispatch(
            TrackingAction::Track,
            ContextPatch::new()
                .identifier(identifier)
                .clear_record()
                .clear_last_error(),
        )
    }

    /// Re-attempt the lookup without resetting the retry counter.
    pub fn retry(&mut self) -> Result<TrackingState, TrackingError> {
        let patch = if self.state == TrackingState::Timeout {
            ContextPatch::new().exhaustion_acknowledged(true)
        } else {
            ContextPatch::new()
        };
        self.dispatch(TrackingAction::Retry, patch)
    }

    /// Return to `idle` with a fresh context. Any attempt in flight is dropped.
    pub fn clear(&mut self) -> Result<TrackingState, TrackingError> {
        if let Some(pending) = &self.pending {
            info!(
                session = %self.session_id,
                generation = pending.generation,
                "Clearing with lookup in flight, result will be discarded"
            );
        }
        self.dispatch(TrackingAction::Clear, ContextPatch::reset())
    }

    /// Apply the outcome of lookup attempt `generation`.
    ///
    /// Failures bump the retry counter and land in `error`, or in `timeout`
    /// once the budget is spent. A success lands in `success`, unless the
    /// budget was spent without the user retrying from `timeout`, in which
    /// case it lands in `timeout` as well.
    pub fn settle(
        &mut self,
        generation: u64,
        outcome: Result<ShipmentRecord, LookupError>,
    ) -> Result<TrackingState, TrackingError> {
        let is_current = self.state == TrackingState::Loading
            && self
                .pending
                .as_ref()
                .is_some_and(|p| p.generation == generation);
        if !is_current {
            debug!(
                session = %self.session_id,
                generation,
                current = self.generation,
                "Discarding stale lookup result"
            );
            STALE_LOOKUPS.inc();
            return Err(TrackingError::StaleLookup { generation });
        }

        match outcome {
            Ok(record) => {
                if self.context.retries_exhausted() && !self.context.exhaustion_acknowledged {
                    warn!(
                        session = %self.session_id,
                        identifier = %record.identifier,
                        "Lookup succeeded after retries were exhausted"
                    );
                    LOOKUP_ATTEMPTS.with_label_values(&["late_success"]).inc();
                    return self.dispatch(TrackingAction::Timeout, ContextPatch::new());
                }

                LOOKUP_ATTEMPTS.with_label_values(&["success"]).inc();
                self.dispatch(
                    TrackingAction::Success,
                    ContextPatch::new().record(record).clear_last_error(),
                )
            }
            Err(error) => {
                LOOKUP_ATTEMPTS.with_label_values(&[error.kind()]).inc();
                let retry_count = self
                    .context
                    .retry_count
                    .saturating_add(1)
                    .min(self.context.max_retries);
                let patch = ContextPatch::new()
                    .retry_count(retry_count)
                    .last_error(error.to_string());

                if retry_count >= self.context.max_retries {
                    warn!(
                        session = %self.session_id,
                        retry_count,
                        error = %error,
                        "Lookup retries exhausted"
                    );
                    self.dispatch(TrackingAction::Timeout, patch)
                } else {
                    info!(
                        session = %self.session_id,
                        retry_count,
                        error = %error,
                        "Lookup attempt failed"
                    );
                    self.dispatch(TrackingAction::Error, patch)
                }
            }
        }
    }

    /// Run the pending attempt inline and settle it.
    ///
    /// Sequential hosts and tests use this instead of a runner. Returns `None`
    /// when nothing is pending.
    pub async fn run_pending_lookup(
        &mut self,
        lookup: &dyn LookupService,
    ) -> Option<Result<TrackingState, TrackingError>> {
        let request = self.pending.clone()?;
        let outcome = run_attempt(lookup, &request.identifier, None).await;
        Some(self.settle(request.generation, outcome))
    }

    fn present(&self) {
        let result = catch_unwind(AssertUnwindSafe(|| {
            self.presenter.render(self.state, &self.context)
        }));

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                PRESENTER_FAILURES.inc();
                warn!(session = %self.session_id, state = %self.state, "Render failed: {}", e);
            }
            Err(_) => {
                PRESENTER_FAILURES.inc();
                warn!(session = %self.session_id, state = %self.state, "Presenter panicked");
            }
        }
    }
}

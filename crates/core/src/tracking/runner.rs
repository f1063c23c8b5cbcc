//! Async orchestration around the tracking controller.
//!
//! One task owns the controller and consumes commands from a bounded queue.
//! Every lookup attempt runs in its own task and reports back through a
//! second queue, so a completion is always a separate, later event.
//! A shutdown broadcast stops the runner even while handles are still held.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::metrics::LOOKUP_DURATION;

use super::controller::{TrackingController, TrackingSnapshot};
use super::error::{LookupError, TrackingError};
use super::identifier::validate_identifier;
use super::traits::LookupService;
use super::types::ShipmentRecord;

/// Result of a single lookup attempt.
pub type LookupOutcome = Result<ShipmentRecord, LookupError>;

type Reply<T> = oneshot::Sender<T>;

/// Validate the identifier, then ask the lookup service, bounded by `deadline`.
pub async fn run_attempt(
    lookup: &dyn LookupService,
    identifier: &str,
    deadline: Option<Duration>,
) -> LookupOutcome {
    validate_identifier(identifier)?;

    let started = Instant::now();
    let outcome = match deadline {
        Some(limit) => match tokio::time::timeout(limit, lookup.lookup(identifier)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(LookupError::DeadlineExceeded(limit.as_millis() as u64)),
        },
        None => lookup.lookup(identifier).await,
    };
    LOOKUP_DURATION
        .with_label_values(&[lookup.name()])
        .observe(started.elapsed().as_secs_f64());

    outcome
}

enum Command {
    Track {
        identifier: String,
        reply: Reply<Result<TrackingSnapshot, TrackingError>>,
    },
    Retry {
        reply: Reply<Result<TrackingSnapshot, TrackingError>>,
    },
    Clear {
        reply: Reply<Result<TrackingSnapshot, TrackingError>>,
    },
    Snapshot {
        reply: Reply<TrackingSnapshot>,
    },
}

/// Handle for driving a tracking session.
///
/// This is cheaply cloneable and can be shared across tasks. Every call is
/// serialized through the runner, so the controller only ever sees one
/// action at a time.
#[derive(Clone)]
pub struct TrackingHandle {
    tx: mpsc::Sender<Command>,
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for TrackingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl TrackingHandle {
    /// Submit a waybill number.
    pub async fn track(
        &self,
        identifier: impl Into<String>,
    ) -> Result<TrackingSnapshot, TrackingError> {
        let identifier = identifier.into();
        self.request(|reply| Command::Track { identifier, reply })
            .await?
    }

    /// Re-attempt the last lookup.
    pub async fn retry(&self) -> Result<TrackingSnapshot, TrackingError> {
        self.request(|reply| Command::Retry { reply }).await?
    }

    /// Reset the session to `idle`.
    pub async fn clear(&self) -> Result<TrackingSnapshot, TrackingError> {
        self.request(|reply| Command::Clear { reply }).await?
    }

    /// Current state and context.
    pub async fn snapshot(&self) -> Result<TrackingSnapshot, TrackingError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Stop the runner and every task watching [`TrackingHandle::shutdown_signal`].
    ///
    /// Queued commands are answered with [`TrackingError::RunnerClosed`] and the
    /// in-flight lookup is aborted.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Receiver that fires once [`TrackingHandle::shutdown`] is called.
    pub fn shutdown_signal(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, TrackingError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| TrackingError::RunnerClosed)?;
        reply_rx.await.map_err(|_| TrackingError::RunnerClosed)
    }
}

/// Background task that owns the controller.
pub struct TrackingRunner {
    controller: TrackingController,
    lookup: Arc<dyn LookupService>,
    deadline: Option<Duration>,
    rx: mpsc::Receiver<Command>,
    settled_tx: mpsc::UnboundedSender<(u64, LookupOutcome)>,
    settled_rx: mpsc::UnboundedReceiver<(u64, LookupOutcome)>,
    in_flight: Option<(u64, JoinHandle<()>)>,
    shutdown_rx: broadcast::Receiver<()>,
}

/// Create a tracking handle and the runner that serves it.
///
/// Spawn `runner.run()` on the runtime; it exits on [`TrackingHandle::shutdown`]
/// or once every handle is dropped.
pub fn create_tracking_runner(
    controller: TrackingController,
    lookup: Arc<dyn LookupService>,
    deadline: Option<Duration>,
    buffer_size: usize,
) -> (TrackingHandle, TrackingRunner) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let (settled_tx, settled_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let handle = TrackingHandle { tx, shutdown_tx };
    let runner = TrackingRunner {
        controller,
        lookup,
        deadline,
        rx,
        settled_tx,
        settled_rx,
        in_flight: None,
        shutdown_rx,
    };

    (handle, runner)
}

impl TrackingRunner {
    /// Run until shutdown is signalled or every handle is dropped.
    pub async fn run(mut self) {
        info!(
            session = %self.controller.session_id(),
            lookup = self.lookup.name(),
            "Tracking runner started"
        );

        loop {
            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some((generation, outcome)) = self.settled_rx.recv() => {
                    self.handle_settled(generation, outcome);
                }
                _ = self.shutdown_rx.recv() => {
                    info!("Tracking runner received shutdown signal");
                    break;
                }
            }
            self.sync_lookup();
        }

        if let Some((generation, task)) = self.in_flight.take() {
            debug!(generation, "Aborting in-flight lookup on shutdown");
            task.abort();
        }
        info!(session = %self.controller.session_id(), "Tracking runner stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Track { identifier, reply } => {
                let result = self.controller.track(&identifier);
                let _ = reply.send(result.map(|_| self.controller.snapshot()));
            }
            Command::Retry { reply } => {
                let result = self.controller.retry();
                let _ = reply.send(result.map(|_| self.controller.snapshot()));
            }
            Command::Clear { reply } => {
                let result = self.controller.clear();
                let _ = reply.send(result.map(|_| self.controller.snapshot()));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.controller.snapshot());
            }
        }
    }

    fn handle_settled(&mut self, generation: u64, outcome: LookupOutcome) {
        if matches!(&self.in_flight, Some((g, _)) if *g == generation) {
            self.in_flight = None;
        }
        if let Err(e) = self.controller.settle(generation, outcome) {
            debug!(generation, "Lookup result not applied: {}", e);
        }
    }

    /// Make the running attempt match the controller's pending request.
    fn sync_lookup(&mut self) {
        let wanted = self.controller.pending_lookup().cloned();
        let running = self.in_flight.as_ref().map(|(generation, _)| *generation);

        if wanted.as_ref().map(|r| r.generation) == running {
            return;
        }

        if let Some((generation, task)) = self.in_flight.take() {
            warn!(generation, "Cancelling superseded lookup attempt");
            task.abort();
        }

        if let Some(request) = wanted {
            debug!(
                generation = request.generation,
                identifier = %request.identifier,
                "Starting lookup attempt"
            );
            let lookup = Arc::clone(&self.lookup);
            let settled_tx = self.settled_tx.clone();
            let deadline = self.deadline;
            let generation = request.generation;

            let task = tokio::spawn(async move {
                let outcome = run_attempt(lookup.as_ref(), &request.identifier, deadline).await;
                let _ = settled_tx.send((request.generation, outcome));
            });
            self.in_flight = Some((generation, task));
        }
    }
}

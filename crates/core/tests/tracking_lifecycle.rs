//! Tracking session lifecycle integration tests.
//!
//! These drive a full session through the runner with mock collaborators:
//! idle -> loading -> success / error -> timeout -> loading -> ...

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use waybill_core::{
    config::TrackingConfig,
    create_tracking_runner,
    testing::{fixtures, MockLookupService, RecordingPresenter},
    ContextPatch, LookupError, TrackingAction, TrackingContext, TrackingController,
    TrackingError, TrackingHandle, TrackingSnapshot, TrackingState, TrackingView, ViewConfig,
};

/// Test helper owning a running session and its mocks.
struct TestHarness {
    handle: TrackingHandle,
    lookup: Arc<MockLookupService>,
    presenter: Arc<RecordingPresenter>,
    runner: JoinHandle<()>,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_deadline(None)
    }

    fn with_deadline(deadline: Option<Duration>) -> Self {
        let lookup = Arc::new(MockLookupService::new());
        let presenter = Arc::new(RecordingPresenter::new());
        let controller = TrackingController::new(&TrackingConfig::default(), presenter.clone());
        let (handle, runner) = create_tracking_runner(controller, lookup.clone(), deadline, 32);
        let runner = tokio::spawn(runner.run());

        Self {
            handle,
            lookup,
            presenter,
            runner,
        }
    }

    /// Poll until the session reaches `state` with no lookup pending.
    async fn settled_in(&self, state: TrackingState) -> TrackingSnapshot {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let snapshot = self.handle.snapshot().await.expect("runner alive");
            if snapshot.state == state && !snapshot.lookup_pending {
                return snapshot;
            }
            if tokio::time::Instant::now() > deadline {
                panic!("expected {state}, still in {}", snapshot.state);
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Poll until the pending lookup has been applied, whatever the outcome.
    async fn settled(&self) -> TrackingSnapshot {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let snapshot = self.handle.snapshot().await.expect("runner alive");
            if snapshot.state != TrackingState::Loading && !snapshot.lookup_pending {
                return snapshot;
            }
            if tokio::time::Instant::now() > deadline {
                panic!("lookup never settled");
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[tokio::test]
async fn test_well_formed_identifier_reaches_success() {
    let harness = TestHarness::new();

    harness.handle.track("GFRT-123456-ABC").await.unwrap();
    let snapshot = harness.settled_in(TrackingState::Success).await;

    let record = snapshot.context.record.expect("record in success");
    assert!(!record.checkpoints().is_empty());
    assert_eq!(snapshot.context.retry_count, 0);
    assert_eq!(
        harness.presenter.states(),
        vec![TrackingState::Loading, TrackingState::Success]
    );
}

#[tokio::test]
async fn test_malformed_identifier_escalates_to_timeout() {
    let harness = TestHarness::new();

    harness.handle.track("BAD-1").await.unwrap();
    let snapshot = harness.settled_in(TrackingState::Error).await;
    assert_eq!(snapshot.context.retry_count, 1);

    harness.handle.retry().await.unwrap();
    let snapshot = harness.settled_in(TrackingState::Error).await;
    assert_eq!(snapshot.context.retry_count, 2);

    harness.handle.retry().await.unwrap();
    let snapshot = harness.settled_in(TrackingState::Timeout).await;
    assert_eq!(snapshot.context.retry_count, 3);

    // Validation failures never reach the backend.
    assert_eq!(harness.lookup.call_count().await, 0);
    assert_eq!(
        harness.presenter.states(),
        vec![
            TrackingState::Loading,
            TrackingState::Error,
            TrackingState::Loading,
            TrackingState::Error,
            TrackingState::Loading,
            TrackingState::Timeout,
        ]
    );
}

#[tokio::test]
async fn test_failures_past_budget_report_exhausted_retries() {
    let harness = TestHarness::new();

    harness.handle.track("BAD-1").await.unwrap();
    let mut snapshot = harness.settled().await;
    for _ in 0..4 {
        harness.handle.retry().await.unwrap();
        snapshot = harness.settled().await;
    }

    assert_eq!(snapshot.state, TrackingState::Timeout);
    assert_eq!(snapshot.context.retry_count, 3);

    let view = TrackingView::project(snapshot.state, &snapshot.context, &ViewConfig::default());
    assert_eq!(
        view.message.as_deref(),
        Some("Retries exhausted (3 of 3). Retry or clear to start over.")
    );
}

#[tokio::test]
async fn test_retry_from_timeout_keeps_counter() {
    let harness = TestHarness::new();
    harness
        .lookup
        .set_failure(Some(LookupError::Unavailable("carrier API down".into())))
        .await;

    harness.handle.track("GFRT-123456-ABC").await.unwrap();
    harness.settled_in(TrackingState::Error).await;
    harness.handle.retry().await.unwrap();
    harness.settled_in(TrackingState::Error).await;
    harness.handle.retry().await.unwrap();
    harness.settled_in(TrackingState::Timeout).await;

    harness.lookup.set_failure(None).await;
    let snapshot = harness.handle.retry().await.unwrap();
    assert_eq!(snapshot.state, TrackingState::Loading);

    let snapshot = harness.settled_in(TrackingState::Success).await;
    assert_eq!(snapshot.context.retry_count, 3);
    assert!(snapshot.context.record.is_some());
}

#[tokio::test]
async fn test_clear_from_every_state_resets_context() {
    let harness = TestHarness::new();
    let fresh = TrackingContext::new(3);

    let snapshot = harness.handle.clear().await.unwrap();
    assert_eq!(snapshot.context, fresh);

    harness.handle.track("GFRT-123456-ABC").await.unwrap();
    harness.settled_in(TrackingState::Success).await;
    let snapshot = harness.handle.clear().await.unwrap();
    assert_eq!(snapshot.state, TrackingState::Idle);
    assert_eq!(snapshot.context, fresh);

    harness.handle.track("BAD-1").await.unwrap();
    harness.settled_in(TrackingState::Error).await;
    let snapshot = harness.handle.clear().await.unwrap();
    assert_eq!(snapshot.context, fresh);
}

#[tokio::test]
async fn test_clear_during_loading_discards_result() {
    let harness = TestHarness::new();
    harness.lookup.set_delay(Duration::from_millis(50)).await;

    harness.handle.track("GFRT-123456-ABC").await.unwrap();
    harness.handle.clear().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, TrackingState::Idle);
    assert!(snapshot.context.record.is_none());
    assert_eq!(harness.presenter.last_state(), Some(TrackingState::Idle));
}

#[tokio::test]
async fn test_new_track_after_clear_wins_the_race() {
    let harness = TestHarness::new();
    harness.lookup.set_delay(Duration::from_millis(40)).await;

    harness.handle.track("GFRT-111111-AAA").await.unwrap();
    harness.handle.clear().await.unwrap();
    harness.handle.track("GFRT-222222-BBB").await.unwrap();

    let snapshot = harness.settled_in(TrackingState::Success).await;
    assert_eq!(
        snapshot.context.record.unwrap().identifier,
        "GFRT-222222-BBB"
    );
    assert_eq!(snapshot.generation, 2);
}

#[tokio::test]
async fn test_deadline_exceeded_counts_toward_timeout() {
    let harness = TestHarness::with_deadline(Some(Duration::from_millis(10)));
    harness.lookup.set_delay(Duration::from_millis(100)).await;

    harness.handle.track("GFRT-123456-ABC").await.unwrap();
    let snapshot = harness.settled_in(TrackingState::Error).await;

    assert_eq!(snapshot.context.retry_count, 1);
    assert_eq!(
        snapshot.context.last_error.as_deref(),
        Some("Lookup exceeded deadline of 10 ms")
    );
}

#[tokio::test]
async fn test_empty_identifier_is_rejected_without_transition() {
    let harness = TestHarness::new();

    let result = harness.handle.track("   ").await;

    assert_eq!(result, Err(TrackingError::EmptyIdentifier));
    assert_eq!(harness.presenter.render_count(), 0);
    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, TrackingState::Idle);
}

#[tokio::test]
async fn test_presenter_failure_does_not_stop_session() {
    let harness = TestHarness::new();
    harness.presenter.fail_renders(true);

    harness.handle.track("GFRT-123456-ABC").await.unwrap();
    let snapshot = harness.settled_in(TrackingState::Success).await;

    assert!(snapshot.context.record.is_some());
    assert_eq!(harness.presenter.render_count(), 0);
}

#[tokio::test]
async fn test_runner_exits_after_last_handle() {
    let TestHarness { handle, runner, .. } = TestHarness::new();
    let clone = handle.clone();
    drop(handle);
    drop(clone);

    tokio::time::timeout(Duration::from_secs(1), runner)
        .await
        .expect("runner did not stop")
        .unwrap();
}

#[test]
fn test_late_success_after_exhaustion_routes_to_timeout() {
    let presenter = Arc::new(RecordingPresenter::new());
    let mut controller = TrackingController::new(&TrackingConfig::default(), presenter);
    let exhausted = fixtures::failed_context("GFRT-123456-ABC", 3, 3);

    controller
        .dispatch(
            TrackingAction::Track,
            ContextPatch::new()
                .identifier(exhausted.identifier)
                .retry_count(exhausted.retry_count),
        )
        .unwrap();
    let generation = controller.generation();

    let state = controller
        .settle(generation, Ok(fixtures::shipment("GFRT-123456-ABC")))
        .unwrap();

    assert_eq!(state, TrackingState::Timeout);
    assert!(controller.context().record.is_none());
    assert_eq!(controller.context().retry_count, 3);
}

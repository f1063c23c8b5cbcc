//! Mock lookup service for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::tracking::{LookupError, LookupService, ShipmentRecord};

use super::fixtures;

/// Mock implementation of the LookupService trait.
///
/// Provides controllable behavior for testing:
/// - Queue outcomes that are returned in order
/// - Fail every call with a fixed error
/// - Simulate latency
/// - Track looked-up identifiers for assertions
///
/// With nothing queued, a lookup succeeds with [`fixtures::shipment`].
///
/// # Example
///
/// ```rust,ignore
/// use waybill_core::testing::MockLookupService;
///
/// let lookup = MockLookupService::new();
/// lookup.push_outcome(Err(LookupError::NotFound("GFRT-000000-AAA".into()))).await;
///
/// assert!(lookup.lookup("GFRT-000000-AAA").await.is_err());
/// assert!(lookup.lookup("GFRT-000000-AAA").await.is_ok());
/// assert_eq!(lookup.call_count().await, 2);
/// ```
#[derive(Debug, Default)]
pub struct MockLookupService {
    /// Outcomes returned before falling back to the default behavior.
    outcomes: Arc<RwLock<VecDeque<Result<ShipmentRecord, LookupError>>>>,
    /// If set, every unqueued lookup fails with this error.
    failure: Arc<RwLock<Option<LookupError>>>,
    /// Latency added to every lookup.
    delay: Arc<RwLock<Duration>>,
    /// Identifiers in call order.
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockLookupService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one outcome.
    pub async fn push_outcome(&self, outcome: Result<ShipmentRecord, LookupError>) {
        self.outcomes.write().await.push_back(outcome);
    }

    /// Make every unqueued lookup fail (or stop failing with `None`).
    pub async fn set_failure(&self, error: Option<LookupError>) {
        *self.failure.write().await = error;
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Identifiers looked up so far.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }
}

#[async_trait]
impl LookupService for MockLookupService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn lookup(&self, identifier: &str) -> Result<ShipmentRecord, LookupError> {
        self.calls.write().await.push(identifier.to_string());

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(outcome) = self.outcomes.write().await.pop_front() {
            return outcome;
        }
        if let Some(error) = self.failure.read().await.clone() {
            return Err(error);
        }
        Ok(fixtures::shipment(identifier))
    }
}

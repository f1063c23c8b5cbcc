//! Collaborator seams of the tracking controller.

use async_trait::async_trait;

use super::error::{LookupError, PresenterError};
use super::state::TrackingState;
use super::types::{ShipmentRecord, TrackingContext};

/// Projects a tracking state onto a UI surface.
///
/// Called after every accepted transition. Implementations must be idempotent:
/// rendering the same `(state, context)` twice must not change what the user
/// sees after the first call. A returned error is logged by the controller and
/// never undoes the transition.
pub trait Presenter: Send + Sync {
    fn render(&self, state: TrackingState, context: &TrackingContext)
        -> Result<(), PresenterError>;
}

/// Resolves a waybill number into a shipment record.
#[async_trait]
pub trait LookupService: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Look up a shipment. The identifier has already passed the format check.
    async fn lookup(&self, identifier: &str) -> Result<ShipmentRecord, LookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLookup;

    #[async_trait]
    impl LookupService for FixedLookup {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn lookup(&self, identifier: &str) -> Result<ShipmentRecord, LookupError> {
            Err(LookupError::NotFound(identifier.to_string()))
        }
    }

    #[test]
    fn test_lookup_trait_object() {
        let service: Box<dyn LookupService> = Box::new(FixedLookup);
        let result = tokio_test::block_on(service.lookup("GFRT-123456-ABC"));
        assert_eq!(service.name(), "fixed");
        assert!(matches!(result, Err(LookupError::NotFound(_))));
    }
}

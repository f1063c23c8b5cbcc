//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process server
//! with a mock lookup service injected, so the full HTTP surface can be
//! exercised without a carrier backend.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use waybill_core::{
    create_tracking_runner, testing::MockLookupService, Config, TrackingController,
    TrackingHandle, ViewConfig,
};
use waybill_server::api::{create_router, BroadcastPresenter, WsBroadcaster};
use waybill_server::state::AppState;

/// Re-export fixtures for test convenience
pub use waybill_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_track() {
///     let fixture = TestFixture::new().await;
///
///     let response = fixture.post("/api/v1/tracking/track", json!({
///         "identifier": "GFRT-123456-ABC"
///     })).await;
///
///     assert_eq!(response.status, StatusCode::OK);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock lookup service - queue outcomes, add latency
    pub lookup: Arc<MockLookupService>,
    /// Broadcaster feeding WebSocket clients - subscribe to observe frames
    pub ws_broadcaster: WsBroadcaster,
    /// Handle to the session behind the router
    pub tracking: TrackingHandle,
    /// The spawned runner task
    pub runner: JoinHandle<()>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with default config.
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(config: Config) -> Self {
        let lookup = Arc::new(MockLookupService::new());
        let ws_broadcaster = WsBroadcaster::new(64);

        let presenter = Arc::new(BroadcastPresenter::new(
            ws_broadcaster.clone(),
            ViewConfig::from(&config.tracking),
        ));
        let controller = TrackingController::new(&config.tracking, presenter.clone());
        presenter.set_session(controller.session_id());

        let deadline = config.lookup.deadline_ms.map(Duration::from_millis);
        let (tracking, runner) = create_tracking_runner(
            controller,
            Arc::clone(&lookup) as Arc<dyn waybill_core::LookupService>,
            deadline,
            config.runner.command_buffer,
        );
        let runner = tokio::spawn(runner.run());

        let state = Arc::new(AppState::new(
            config,
            tracking.clone(),
            ws_broadcaster.clone(),
        ));
        let router = create_router(state);

        Self {
            router,
            lookup,
            ws_broadcaster,
            tracking,
            runner,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Fetch a path and return the raw body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    /// Poll `GET /api/v1/tracking` until the state matches and no lookup is pending.
    pub async fn wait_for_state(&self, state: &str) -> TestResponse {
        for _ in 0..200 {
            let response = self.get("/api/v1/tracking").await;
            if response.body["state"] == state && response.body["lookup_pending"] == false {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("tracking never reached state {}", state);
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

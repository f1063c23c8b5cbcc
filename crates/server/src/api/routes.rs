use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, tracking, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Widget static files path (configurable via env)
    let widget_dir = std::env::var("WIDGET_DIR").unwrap_or_else(|_| "widget".to_string());

    // API routes
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Tracking widget
        .route("/tracking", get(tracking::get_tracking))
        .route("/tracking/track", post(tracking::track))
        .route("/tracking/retry", post(tracking::retry))
        .route("/tracking/clear", post(tracking::clear))
        // Render frames
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    // Serve widget with index fallback
    let index_path = format!("{}/index.html", widget_dir);
    let serve_dir = ServeDir::new(&widget_dir).fallback(ServeFile::new(&index_path));

    Router::new()
        .nest("/api/v1", api_routes)
        .fallback_service(serve_dir)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

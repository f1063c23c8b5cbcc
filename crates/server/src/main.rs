use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use waybill_core::{
    create_lookup_service, create_tracking_runner, load_config, lookup_deadline, validate_config,
    LookupService as _, TrackingController, ViewConfig,
};
use waybill_server::api::{create_router, BroadcastPresenter, WsBroadcaster};
use waybill_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How long to wait for the tracking runner after the server stops
const RUNNER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("WAYBILL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!(
        "Tracking policy: max_retries={}, expected_checkpoints={}",
        config.tracking.max_retries, config.tracking.expected_checkpoints
    );

    // Create lookup service
    let lookup = create_lookup_service(&config.lookup);
    let deadline = lookup_deadline(&config.lookup);
    info!(
        "Using lookup service: {} (deadline: {:?})",
        lookup.name(),
        deadline
    );

    // Create WebSocket broadcaster and the presenter that feeds it
    let ws_broadcaster = WsBroadcaster::new(config.runner.frame_buffer);
    let presenter = Arc::new(BroadcastPresenter::new(
        ws_broadcaster.clone(),
        ViewConfig::from(&config.tracking),
    ));

    // Create the tracking session
    let controller = TrackingController::new(&config.tracking, presenter.clone());
    presenter.set_session(controller.session_id());
    info!(session = %controller.session_id(), "Tracking session created");

    let (tracking, runner) =
        create_tracking_runner(controller, lookup, deadline, config.runner.command_buffer);
    let runner_handle = tokio::spawn(runner.run());
    let shutdown_handle = tracking.clone();

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), tracking, ws_broadcaster));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown. Stopping the runner also closes open
    // WebSocket connections, which axum does not wait for.
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown_handle.shutdown();
        })
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    match tokio::time::timeout(RUNNER_SHUTDOWN_TIMEOUT, runner_handle).await {
        Ok(_) => info!("Tracking runner stopped"),
        Err(_) => warn!("Tracking runner still busy after shutdown, abandoning it"),
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

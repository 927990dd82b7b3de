//! Smartlead Relay - webhook receiver that records campaign events in Notion.
//!
//! This binary:
//! - Receives Smartlead webhooks on `POST /api/webhook`
//! - Verifies the HMAC-SHA256 body signature
//! - Maps each event to a Notion database row and creates it
//! - Serves `GET /health` for platform health checks

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relay::{router, AppState, Config, Publisher};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("relay_starting");

    // Missing secrets or destination are fatal here, never per request
    let config = Config::from_env().context("Invalid configuration")?;
    info!(
        port = config.port,
        destination = config.destination.name(),
        database_id_set = !config.database_id.is_empty(),
        request_timeout_ms = config.request_timeout.as_millis() as u64,
        max_attempts = config.retry.max_attempts,
        base_delay_ms = config.retry.base_delay.as_millis() as u64,
        "config_loaded"
    );

    let publisher = Publisher::from_config(&config).context("Failed to create publisher")?;
    info!(destination = publisher.destination().name(), "publisher_created");

    let port = config.port;
    let app = router(AppState::new(config, publisher));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "relay_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("relay_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(signal = "SIGINT", "relay_signal_received"),
        _ = terminate => info!(signal = "SIGTERM", "relay_signal_received"),
    }

    info!("relay_shutting_down");
}

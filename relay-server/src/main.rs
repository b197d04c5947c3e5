//! Kiosk Relay server.
//!
//! Receives kiosk webhook notifications, verifies their HMAC signatures,
//! and relays asset ids to the configured Immich album.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kiosk_relay::web::app;
use kiosk_relay::{AppState, Config, RelayClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("relay_server_starting");

    // Load .env if present, then configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    info!(
        port = config.port,
        secret_configured = !config.secret.is_empty(),
        immich_url_configured = !config.immich_url.is_empty(),
        api_key_configured = !config.immich_api_key.is_empty(),
        album_id_configured = !config.album_id.is_empty(),
        "config_loaded"
    );

    // Create the Immich relay client
    let relay = RelayClient::new(&config).context("Failed to create relay client")?;
    info!("relay_client_created");

    // Create application state and router
    let state = AppState::new(config.clone(), relay);
    let app = app(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "relay_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("relay_server_shutdown_complete");

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
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("relay_server_shutting_down");
}

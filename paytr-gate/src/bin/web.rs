//! PayTR Gate Web Server - webhook receiver for PayTR payment notifications.
//!
//! This binary provides a thin web server that:
//! - Receives PayTR notifications
//! - Verifies their signature and drops duplicates
//! - Hands admitted notifications to the downstream handler
//!
//! A background task periodically evicts payload fingerprints that fell out
//! of the replay window.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal, task::JoinHandle, time};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use paytr_gate::{router, AppState, Config, Gate};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        merchant_key_configured = config.merchant_key.is_some(),
        merchant_salt_configured = config.merchant_salt.is_some(),
        hash_field_order = ?config.hash_field_order,
        replay_window_secs = config.replay_window.as_secs(),
        "config_loaded"
    );

    if !config.is_signing_configured() {
        warn!("paytr_secrets_missing_all_requests_will_fail");
    }

    let state = AppState::new(Gate::from_config(&config));
    let sweeper = config
        .sweep_interval
        .map(|every| spawn_fingerprint_sweep(state.clone(), every));

    let app = router(state).layer(TraceLayer::new_for_http());

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Evict expired fingerprints every `every`.
fn spawn_fingerprint_sweep(state: AppState, every: time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(every);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = state.gate.sweep_expired();
            if removed > 0 {
                info!(
                    removed = removed,
                    remaining = state.gate.tracker().tracked_fingerprints(),
                    "fingerprints_evicted"
                );
            }
        }
    })
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

    info!("web_server_shutting_down");
}

mod api;
mod diagnostics;
mod health;
mod state;

use std::future::IntoFuture;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;

use haulquote_core::config::{AppConfig, LoadOptions};
use haulquote_relay::{DiagnosticsLog, Dispatcher};

use crate::state::AppState;

fn init_logging(config: &AppConfig) {
    use haulquote_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let diagnostics = DiagnosticsLog::new(config.relay.diagnostics_capacity);
    let dispatcher = Dispatcher::new(config.relay.clone(), diagnostics)
        .context("relay dispatcher failed to initialize")?;
    let state = AppState::new(dispatcher, config.attribution.clone());

    let app = router(state);

    let address = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("could not bind {address}"))?;

    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        attribution_enabled = config.attribution.enabled,
        "haulquote-server started"
    );

    let drain_deadline = std::time::Duration::from_secs(config.server.graceful_shutdown_secs);
    let (signal_tx, signal_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown().await;
            let _ = signal_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        _ = async {
            let _ = signal_rx.await;
            tokio::time::sleep(drain_deadline).await;
        } => {
            tracing::warn!(
                event_name = "system.server.drain_deadline",
                grace_secs = config.server.graceful_shutdown_secs,
                "in-flight requests did not drain before the deadline, closing anyway"
            );
        }
    }

    tracing::info!(event_name = "system.server.stopped", "haulquote-server stopped");
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/quote", post(api::post_quote))
        .route("/api/leads", post(api::post_lead))
        .route("/api/orders", post(api::post_order))
        .route("/api/webhooks/diagnostics", get(diagnostics::webhook_diagnostics))
        .route("/health", get(health::health))
        .with_state(state)
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            error = %error,
            "failed to listen for shutdown signal"
        );
    }
}

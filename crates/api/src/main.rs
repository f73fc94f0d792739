//! Questlog - gamified task service
//!
//! Main entry point for the HTTP server.

use std::sync::Arc;

use anyhow::Context;
use questlog_api::{router, AppContext};
use questlog_infra::{config, observability};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loads .env before reading QUESTLOG_* variables
    let config = config::load().context("failed to load configuration")?;
    observability::init_tracing(&config.logging).context("failed to initialise logging")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let ctx = Arc::new(AppContext::new(config).context("failed to initialise application")?);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "Questlog listening");

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Questlog stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
    }
}

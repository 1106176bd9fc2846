use std::sync::Arc;

use anyhow::{Context, Result};
use metering_service::{api, config::AppConfig, metrics_server, observability, store, MeteringService};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr).await?;
    }

    let store = store::connect(&cfg.database).await?;
    let service = Arc::new(MeteringService::new(store, cfg.generator.clone()));

    let listener = tokio::net::TcpListener::bind(&cfg.http.bind_addr)
        .await
        .with_context(|| format!("failed to bind http listener on {}", cfg.http.bind_addr))?;
    tracing::info!(addr = %cfg.http.bind_addr, "metering api listening");

    axum::serve(listener, api::router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

//! # packcalc-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the pack calculator.
//! Binds to `SERVER_PORT` (default 8080).

use std::net::SocketAddr;

use packcalc_api::config::{AppConfig, LogFormat};
use packcalc_api::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    init_tracing(
        config
            .as_ref()
            .map(|c| c.log_format)
            .unwrap_or_default(),
    );
    let config = config.map_err(|e| {
        tracing::error!("invalid configuration: {e}");
        e
    })?;
    tracing::debug!(?config, "configuration loaded");

    // Database pool is optional; absent means in-memory only.
    let db_pool = packcalc_api::db::init_pool(config.database_url.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("database initialization failed: {e}");
            e
        })?;

    let port = config.port;
    let metrics_enabled = config.metrics_enabled;
    let mut state = AppState::with_pool(config, db_pool);

    if metrics_enabled {
        let handle = packcalc_api::middleware::metrics::install_recorder().map_err(|e| {
            tracing::error!("failed to install metrics recorder: {e}");
            e
        })?;
        state = state.with_metrics(handle);
    }

    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("database hydration failed: {e}");
        e
    })?;

    match state.packs.snapshot() {
        Some(active) => tracing::info!(pack_sizes = ?active.sizes().to_vec(), "pack sizes active"),
        None => tracing::warn!("no pack sizes configured; calculations fail until POST /api/packs"),
    }

    let app = packcalc_api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("pack calculator listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

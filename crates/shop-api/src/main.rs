//! Storefront API - Main Entry Point

use shop_api::{build_router, ApiConfig, AppState};
use shop_notify::{Channel, LogProvider, NotificationProvider};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Storefront API v{}", env!("CARGO_PKG_VERSION"));

    let config = ApiConfig::from_env()?;
    let bind_addr: SocketAddr = config.bind_addr.parse()?;
    if config.dev_mode {
        tracing::warn!("running in dev mode");
    }

    let providers: Vec<Arc<dyn NotificationProvider>> = vec![
        Arc::new(LogProvider::new(Channel::Email)),
        Arc::new(LogProvider::new(Channel::Sms)),
    ];
    let (state, worker) = AppState::in_memory(config, providers)?;
    let state = Arc::new(state);

    tokio::spawn(worker.run());
    tokio::spawn(housekeeping(Arc::clone(&state)));

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(%bind_addr, "listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// Expire brute-force counters and used refresh tokens
async fn housekeeping(state: Arc<AppState>) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        let counters = state.bruteforce.sweep();
        let tokens = state.auth.tokens().purge_expired();
        if counters > 0 || tokens > 0 {
            tracing::debug!(counters, tokens, "housekeeping");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

mod bootstrap;
mod health;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use stocky_agent::StockAlertMonitor;
use stocky_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use stocky_core::config::LogFormat::*;
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
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    if app.config.alerts.poll_interval_secs > 0 {
        spawn_alert_poller(app.monitor.clone(), app.config.alerts.poll_interval_secs);
    }

    let state = routes::AppState {
        pipeline: app.pipeline.clone(),
        monitor: app.monitor.clone(),
        controller: app.controller.clone(),
        inbound_serial: Arc::new(tokio::sync::Mutex::new(())),
    };
    let router = routes::router(state).merge(health::router(app.db_pool.clone()));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        "stocky-server listening"
    );

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(event_name = "system.server.stopping", "stocky-server stopping");
    Ok(())
}

/// Background check at the configured cadence. Outcomes are logged; the
/// monitor itself absorbs every failure.
fn spawn_alert_poller(monitor: Arc<StockAlertMonitor>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            let outcome = monitor.check_and_alert().await;
            tracing::debug!(outcome = ?outcome, "periodic stock check completed");
        }
    });
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %error, "failed to listen for shutdown signal");
    }
}

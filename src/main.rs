//! # Battery Monitor
//!
//! HTTP service that ingests battery/vehicle telemetry and serves latest
//! readings, alerts and windowed summaries per vehicle.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use battery_monitor::api::{self, AppState};
use battery_monitor::config::{Config, LoggingConfig};
use battery_monitor::store;

/// File name prefix for rolling log files
const LOG_FILE_PREFIX: &str = "battery-monitor.log";

/// Main entry point for Battery Monitor
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (CLI argument, `BATTERY_MONITOR_CONFIG`, or
///      `config/default.toml`; built-in defaults when the file is missing)
///    - Set up logging with tracing subscriber
///    - Open the telemetry store and apply best-effort time-series tuning
///
/// 2. **Serve**
///    - Bind the HTTP listener and serve the API
///
/// 3. **Graceful Shutdown**
///    - Ctrl+C stops accepting connections and drains in-flight requests
///
/// # Errors
///
/// Returns error if:
/// - The configuration file exists but is invalid
/// - The store cannot be opened
/// - The listen address cannot be bound
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = Config::resolve_path(std::env::args().nth(1));
    let config = if config_path.exists() {
        Config::load(&config_path)
            .with_context(|| format!("loading configuration from {}", config_path.display()))?
    } else {
        Config::default()
    };

    let _log_guard = init_logging(&config.logging);

    info!("Battery Monitor v{} starting...", env!("CARGO_PKG_VERSION"));
    if config_path.exists() {
        info!("Configuration loaded from {}", config_path.display());
    } else {
        info!("No configuration at {}, using defaults", config_path.display());
    }

    let store = store::open_store(&config.storage).context("opening telemetry store")?;
    let state = Arc::new(AppState::new(store));

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {}", address))?;

    info!("Press Ctrl+C to exit");
    api::serve(listener, state, shutdown_signal()).await?;

    info!("Battery Monitor stopped");
    Ok(())
}

/// Initialize stdout logging, plus a daily rolling file when `log_dir` is set.
///
/// `RUST_LOG` takes precedence over the configured level. The returned guard
/// must be held for the life of the process so buffered file output is flushed.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_layer, guard) = if config.log_dir.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down...");
    }
}

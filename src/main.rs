//! # Rover Telemetry
//!
//! Poll a mobile rover over HTTP, record its trajectory and drive simple
//! battery-aware commands.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use rover_telemetry::client::HttpRoverApi;
use rover_telemetry::config::{Config, DiagnosticsConfig};
use rover_telemetry::control::{BatteryPolicy, ControlLoop, CycleOutcome};
use rover_telemetry::persistence::TelemetryLog;

/// Configuration file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix of the rolling diagnostics log
const DIAGNOSTICS_FILE_PREFIX: &str = "rover-telemetry.log";

/// Main entry point for Rover Telemetry
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or `config/default.toml`)
///    - Set up logging with tracing subscriber
///    - Replay the durable log into the state store
///    - Start a rover session (fatal if none is issued)
///
/// 2. **Main Loop**
///    - Run one cycle per poll interval; cycles never overlap
///    - A text view logs a summary of each published snapshot
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if:
/// - Configuration cannot be loaded or is invalid
/// - The existing log cannot be read
/// - No session can be started
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref())?;

    let _guard = init_logging(&config.diagnostics)?;

    info!("Rover Telemetry v{} starting...", env!("CARGO_PKG_VERSION"));

    let (log, report) = TelemetryLog::open(&config.log.path)
        .with_context(|| format!("Failed to replay log {}", config.log.path))?;
    info!(
        "Restored {} observations ({} malformed lines)",
        report.succeeded, report.failed
    );

    let api = HttpRoverApi::from_config(&config.api)?;
    let policy = BatteryPolicy::new(config.control.low_battery_threshold);
    let mut control = ControlLoop::start(api, log, policy)
        .await
        .context("Cannot proceed without a rover session")?;

    spawn_text_view(&control);

    let mut ticker = interval(config.control.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Polling every {}ms", config.control.poll_interval_ms);
    info!("Press Ctrl+C to exit");

    let mut skipped: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if control.run_cycle().await == CycleOutcome::Skipped {
                    skipped += 1;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Completed {} cycles, skipped {}", control.cycles(), skipped);
                break;
            }
        }
    }

    Ok(())
}

/// Load the configuration file
///
/// An explicit path must exist. Without one, the default path is used if
/// present and built-in defaults otherwise.
fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path).with_context(|| format!("Failed to load config {}", path)),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load config {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

/// Initialize stdout logging plus the optional rolling diagnostics file
///
/// The returned guard must be held for the file writer to flush.
fn init_logging(diagnostics: &DiagnosticsConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let (file_layer, guard) = if diagnostics.log_dir.is_empty() {
        (None, None)
    } else {
        std::fs::create_dir_all(&diagnostics.log_dir)
            .with_context(|| format!("Failed to create {}", diagnostics.log_dir))?;
        let appender = tracing_appender::rolling::daily(&diagnostics.log_dir, DIAGNOSTICS_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Log a summary line for every published snapshot
fn spawn_text_view<A: rover_telemetry::client::RoverApi>(control: &ControlLoop<A>) {
    let mut snapshots = control.subscribe();

    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            info!("{}", snapshot);
            for line in snapshot.sensor_lines() {
                debug!("  {}", line);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_without_path_falls_back() {
        // The repository ships config/default.toml; either way this succeeds
        let config = load_config(None).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_missing_explicit_path() {
        assert!(load_config(Some("/nonexistent/rover.toml")).is_err());
    }

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }
}

//! Centralized file-based logging system
//!
//! Writes logs under the configured directory, separated by log type:
//! - main/ - every accepted event, JSON lines
//! - error/ - WARN and ERROR only
//! - http/ - request instrumentation and fault lines
//!
//! Accepted events are also mirrored into the telemetry sink when one is given.

use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::infrastructure::config::LoggingConfig;
use crate::telemetry::TelemetryLayer;
use crate::{AppError, Result};

const LOG_TYPES: [&str; 3] = ["main", "error", "http"];

/// Initialize logging
///
/// Returns the appender guards, which must be kept alive for the duration of
/// the program or buffered lines are lost.
pub fn init_logging(config: &LoggingConfig, telemetry: Option<TelemetryLayer>) -> Result<Vec<WorkerGuard>> {
    let logs_dir = Path::new(&config.directory);
    create_log_dirs(logs_dir)?;

    let mut guards = Vec::new();

    let (main_appender, main_guard) = create_appender(logs_dir, "main");
    guards.push(main_guard);

    let (error_appender, error_guard) = create_appender(logs_dir, "error");
    guards.push(error_guard);

    let (http_appender, http_guard) = create_appender(logs_dir, "http");
    guards.push(http_guard);

    let main_layer = tracing_subscriber::fmt::layer()
        .with_writer(main_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .json();

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_appender)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::LevelFilter::WARN);

    let http_layer = tracing_subscriber::fmt::layer()
        .with_writer(http_appender)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target() == "http"
        }));

    let console_layer = config
        .console
        .then(|| tracing_subscriber::fmt::layer().with_target(true).with_level(true));

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| AppError::Logging(format!("invalid filter {:?}: {}", config.filter, e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(main_layer)
        .with(error_layer)
        .with(http_layer)
        .with(console_layer)
        .with(telemetry)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    crate::log_main!(
        tracing::Level::INFO,
        "Logging system initialized. Log files in {}/ directory",
        config.directory.display()
    );

    Ok(guards)
}

fn create_log_dirs(logs_dir: &Path) -> Result<()> {
    for log_type in LOG_TYPES {
        fs::create_dir_all(logs_dir.join(log_type))?;
    }
    Ok(())
}

/// Create a daily rolling file appender in `<logs_dir>/<name>`
fn create_appender(logs_dir: &Path, name: &str) -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::new(Rotation::DAILY, logs_dir.join(name), name);
    tracing_appender::non_blocking(appender)
}

/// Log macro helpers for specific log types
#[macro_export]
macro_rules! log_http {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "http", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_directory {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "directory", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_telemetry {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "telemetry", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_main {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "main", $level, $($arg)+)
    };
}

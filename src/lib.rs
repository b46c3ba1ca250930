//! Company directory backend
//!
//! REST endpoints for companies and employees, wrapped in a request
//! instrumentation pipeline that replays bodies, translates faults into
//! uniform envelopes and ships every log line to a search index.

pub mod directory;
pub mod infrastructure;
pub mod pipeline;
pub mod rest;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use infrastructure::config::{Config, ConfigError, TelemetryConfig};
pub use telemetry::TelemetryError;

use thiserror::Error;

/// Main error type for the directory service
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("Logging error: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

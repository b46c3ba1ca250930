//! Configuration management for the directory service
//!
//! Loads configuration from config.toml at startup.
//! Every value has a default so the service runs without a file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Service configuration
///
/// Loaded from config.toml at startup. Sections map one-to-one onto the
/// server, the request capture pipeline, the log shipper and local logging.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Request body capture settings
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Log index backend settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Local log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port for HTTP API server
    #[serde(default = "default_port")]
    pub port: u16,

    /// Hard limit on a request body read by the pipeline (bytes)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

/// Request capture configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureConfig {
    /// Maximum bytes kept for logging and error reports
    #[serde(default = "default_max_payload_length")]
    pub max_payload_length: usize,

    /// Echo raw internal fault messages to clients
    #[serde(default = "default_expose_internal_messages")]
    pub expose_internal_messages: bool,
}

/// Log index backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Ship log events at all
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    /// Base URL of the indexing backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Index receiving the documents
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Number of concurrent shipping workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Pending events allowed before new ones are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Per-request send timeout in milliseconds
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    /// How long shutdown waits for the queue to drain, in milliseconds
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

/// Local log output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Directory for rolling log files
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    /// EnvFilter directive used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Also write human-readable logs to stdout
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_payload_length: default_max_payload_length(),
            expose_internal_messages: default_expose_internal_messages(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            backend_url: default_backend_url(),
            index_name: default_index_name(),
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            send_timeout_ms: default_send_timeout_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            filter: default_log_filter(),
            console: default_console(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_size() -> usize {
    2 * 1024 * 1024 // 2 MiB
}

fn default_max_payload_length() -> usize {
    10_000
}

fn default_expose_internal_messages() -> bool {
    true
}

fn default_telemetry_enabled() -> bool {
    true
}

fn default_backend_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_index_name() -> String {
    "application-logs".to_string()
}

fn default_workers() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    10_000
}

fn default_send_timeout_ms() -> u64 {
    5_000
}

fn default_shutdown_grace_ms() -> u64 {
    2_000
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_console() -> bool {
    true
}

impl Config {
    /// Load configuration from config.toml file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// # Errors
    /// Returns error if file exists but cannot be read, parsed or validated.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.telemetry.validate()?;
        Ok(config)
    }
}

impl TelemetryConfig {
    /// Reject settings the sink cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.backend_url).map_err(|e| {
            ConfigError::Invalid(format!("telemetry.backend_url '{}': {}", self.backend_url, e))
        })?;
        if self.index_name.trim().is_empty() {
            return Err(ConfigError::Invalid("telemetry.index_name is empty".into()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("telemetry.workers must be > 0".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid("telemetry.queue_capacity must be > 0".into()));
        }
        Ok(())
    }

    #[inline]
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    #[inline]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// Parse error (invalid TOML)
    #[error("Failed to parse config: {0}")]
    Parse(String),
    /// Parsed but unusable value
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.capture.max_payload_length, 10_000);
        assert!(config.capture.expose_internal_messages);
        assert_eq!(config.telemetry.backend_url, "http://localhost:9200");
        assert_eq!(config.telemetry.index_name, "application-logs");
        assert_eq!(config.telemetry.workers, 2);
        assert_eq!(config.logging.directory, PathBuf::from("logs"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [telemetry]
            backend_url = "http://es.internal:9200"
            index_name = "directory-logs"

            [capture]
            max_payload_length = 512
            "#,
        )
        .unwrap();

        assert_eq!(config.telemetry.backend_url, "http://es.internal:9200");
        assert_eq!(config.telemetry.index_name, "directory-logs");
        assert_eq!(config.telemetry.workers, 2);
        assert_eq!(config.capture.max_payload_length, 512);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml("[server\nport = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_backend_url() {
        let err = Config::from_toml("[telemetry]\nbackend_url = \"not a url\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = TelemetryConfig {
            workers: 0,
            ..TelemetryConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durations() {
        let config = TelemetryConfig::default();
        assert_eq!(config.send_timeout(), Duration::from_secs(5));
        assert_eq!(config.shutdown_grace(), Duration::from_secs(2));
    }
}

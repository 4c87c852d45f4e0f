//! Logging setup for the gamebook binary.

use gamebook_error::ConfigError;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Configuration for structured logging.
///
/// Logs always go to stderr so that stdout stays free for the console
/// transport. A log file, when set, receives a plain-text copy.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log level filter (e.g., "info", "debug")
    pub log_level: String,
    /// Enable JSON-formatted logs for structured logging
    pub json_logs: bool,
    /// Optional file that receives a copy of every log line
    pub log_file: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Create a configuration from `RUST_LOG`, falling back to `info`.
    pub fn new() -> Self {
        Self {
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            json_logs: false,
            log_file: None,
        }
    }

    /// Set the log level.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable JSON-formatted logs.
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    /// Append logs to a file as well.
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the global tracing subscriber.
///
/// Fails if the filter does not parse, the log file cannot be opened, or a
/// subscriber is already installed.
pub fn init_observability(config: &ObservabilityConfig) -> Result<(), ConfigError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| ConfigError::new(format!("Invalid log filter '{}': {}", config.log_level, e)))?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file_layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    ConfigError::new(format!("Cannot open log file {}: {}", path.display(), e))
                })?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Logging already initialized: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let config = ObservabilityConfig::new()
            .with_log_level("debug")
            .with_json_logs(true)
            .with_log_file(Some(PathBuf::from("play.log")));
        assert_eq!(config.log_level, "debug");
        assert!(config.json_logs);
        assert_eq!(config.log_file, Some(PathBuf::from("play.log")));
    }

    #[test]
    fn test_bad_filter_rejected() {
        let config = ObservabilityConfig::new().with_log_level("gamebook=loudest");
        let err = init_observability(&config).unwrap_err();
        assert!(err.message.contains("Invalid log filter"));
    }
}

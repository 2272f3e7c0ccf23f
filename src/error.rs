//! Error types for the Gluster exporter

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Gluster exporter
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Backend Errors
    // =========================================================================
    /// Backend command or request failed to run, or reported failure
    #[error("Execution of '{command}' failed: {reason}")]
    Execution { command: String, reason: String },

    /// Backend output did not match the expected schema, or a derived
    /// field was malformed
    #[error("Failed to parse backend output: {0}")]
    Parse(String),

    /// XML decode error (glusterd CLI output)
    #[error("Failed to decode XML output: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// JSON decode error (glusterd2 responses)
    #[error("Failed to decode JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error talking to glusterd2
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Operation not provided by this backend variant
    #[error("Operation not supported by this backend: {0}")]
    Unsupported(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // Metric Errors
    // =========================================================================
    /// Prometheus registration or label error
    #[error("Metric error: {0}")]
    Metric(#[from] prometheus::Error),

    /// A metric with this name is already registered
    #[error("Metric already registered: {0}")]
    DuplicateMetric(String),

    /// A collector with this name is already registered
    #[error("Collector already registered: {0}")]
    DuplicateCollector(String),

    // =========================================================================
    // Startup Errors
    // =========================================================================
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be decoded
    #[error("Failed to parse configuration file: {0}")]
    ConfigFile(#[from] serde_yaml::Error),

    /// Every collector is disabled or none were registered
    #[error("No collectors enabled, refusing to serve an empty endpoint")]
    NoCollectorsEnabled,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for an execution failure of `command`.
    pub fn execution(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Execution {
            command: command.into(),
            reason: reason.into(),
        }
    }
}

//! # Error Types
//!
//! Custom error types for Rover Telemetry using `thiserror`.

use thiserror::Error;

/// Main error type for Rover Telemetry
#[derive(Debug, Error)]
pub enum RoverError {
    /// No session id could be obtained from the rover API (fatal at startup)
    #[error("Rover API did not provide a session id")]
    SessionUnavailable,

    /// Status or sensor fetch failed for this cycle
    #[error("Telemetry fetch failed: {0}")]
    TransientFetch(String),

    /// A durable log line could not be decoded
    #[error("Malformed log line: {0}")]
    MalformedLogLine(String),

    /// Appending to the durable log failed
    #[error("Failed to persist observation to {path}: {source}")]
    Persistence {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Move, stop or charge command was not delivered
    #[error("Command delivery failed: {0}")]
    CommandDelivery(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Rover Telemetry
pub type Result<T> = std::result::Result<T, RoverError>;

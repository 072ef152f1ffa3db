//! Error types for the conformance harness
//!
//! The taxonomy separates connection-level faults, which abort a run, from
//! per-step conditions such as receive timeouts, which the aggregator
//! recovers into step outcomes.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Connection Errors ===
    #[error("Service unavailable at '{endpoint}': {reason}")]
    TransportUnavailable { endpoint: String, reason: String },

    #[error("Timed out after {0} seconds waiting for the connection acknowledgement")]
    ConnectTimeout(u64),

    #[error("Failed to send envelope: {0}")]
    SendFailed(String),

    #[error("Timed out after {0} ms waiting for an inbound envelope")]
    ReceiveTimeout(u64),

    #[error("Channel closed by the service")]
    ChannelClosed,

    // === Protocol Errors ===
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Envelope has no recognizable kind: {0}")]
    UnknownKind(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a transport unavailable error for a connect failure
    pub fn transport_unavailable(endpoint: &str, reason: impl ToString) -> Self {
        Self::TransportUnavailable {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: impl ToString) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}

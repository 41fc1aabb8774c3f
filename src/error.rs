//! Replident Error Types

use thiserror::Error;

/// Result type alias for Replident operations
pub type Result<T> = std::result::Result<T, Error>;

/// Replident error types
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    // Host identity errors
    #[error("Malformed MAC address {mac:?}: {reason}")]
    MalformedMac { mac: String, reason: String },

    // Fact resolution errors
    #[error("Unknown fact: {0}")]
    UnknownFact(String),

    #[error("Fact dependency cycle while resolving {0}")]
    FactCycle(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

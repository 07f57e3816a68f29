//! Redactr error types

use thiserror::Error;

/// Redactr error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// PDF input rejected before extraction
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Named-entity model could not be loaded or installed
    #[error("Model error: {0}")]
    Model(String),

    /// A detector could not be built or failed while scanning
    #[error("Detector error: {0}")]
    Detector(String),

    /// Redaction aborted; no partially redacted text is returned
    #[error("Redaction failed: {0}")]
    Redaction(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Redactr operations
pub type Result<T> = std::result::Result<T, Error>;

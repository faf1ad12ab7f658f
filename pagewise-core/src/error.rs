//! Error types for Pagewise Core

use thiserror::Error;

/// Result type alias using PagewiseError
pub type Result<T> = std::result::Result<T, PagewiseError>;

/// Top-level error type for all Pagewise operations
#[derive(Debug, Error)]
pub enum PagewiseError {
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors reported by the remote EPUB and bookmark services
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors raised by the local key-value cache
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Corrupt entry {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Errors loading reader configuration or heuristic rule files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

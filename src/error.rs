//! Error types for PDF Chatter
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for PDF Chatter operations
///
/// This enum covers configuration loading, the on-disk session layout,
/// index construction and loading, retrieval, response generation and the
/// external backends those operations delegate to.
#[derive(Error, Debug)]
pub enum ChatterError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// On-disk layout and transcript storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Session bookkeeping errors (invalid identifiers, bad upload names)
    #[error("Session error: {0}")]
    Session(String),

    /// The indexing routine failed or produced no usable handle
    #[error("Index build error: {0}")]
    IndexBuild(String),

    /// A persisted index could not be loaded
    #[error("Index load error: {0}")]
    IndexLoad(String),

    /// A query was issued against a session with no registered index
    #[error("No index loaded for session: {0}")]
    IndexNotLoaded(String),

    /// Page retrieval failed
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Response generation failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// External backend process or service errors
    #[error("Backend error: {0}")]
    Backend(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for PDF Chatter operations
///
/// Uses `anyhow::Error` so call sites can attach context while still
/// carrying a [`ChatterError`] underneath for callers that downcast.
pub type Result<T> = anyhow::Result<T>;

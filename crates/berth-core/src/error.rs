//! Error types for Berth operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all Berth crates. Uses `thiserror` for derive macros.
//!
//! The variants follow the recommender's failure taxonomy: configuration
//! problems are fatal, querying an unfitted model is a programmer error, and
//! an unknown yacht identifier is recoverable per query.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur in Berth operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific path.
    #[error("I/O error at {path}: {source}")]
    IoWithPath {
        /// Path that was being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration error (missing columns, bad parameters, bad config file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The recommender was queried before an index was fitted.
    #[error("Model is not fitted: {0}")]
    NotFitted(String),

    /// Yacht (or other content) not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Malformed input that could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not-fitted error.
    pub fn not_fitted(msg: impl Into<String>) -> Self {
        Self::NotFitted(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Wrap a bare I/O error.
    pub fn io(err: std::io::Error) -> Self {
        Self::Io(err)
    }

    /// Wrap an I/O error together with the path that caused it.
    pub fn io_with_path(err: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoWithPath {
            path: path.as_ref().to_path_buf(),
            source: err,
        }
    }

    /// True if this error is a per-query `NotFound`.
    ///
    /// Batch callers use this to record an empty result and keep going.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True if this error comes from configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type alias using Berth's Error type.
pub type Result<T> = std::result::Result<T, Error>;

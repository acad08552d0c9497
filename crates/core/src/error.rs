//! Error types for Ward Assistant.
//!
//! A single error enum covers configuration, I/O, embedding, document store,
//! request validation and serialization failures.

use thiserror::Error;

/// Unified error type for Ward Assistant.
///
/// Library code never panics; every failure is represented here and
/// propagated. The HTTP gateway maps `Validation` and `NotFound` to client
/// errors and everything else to a server error.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Document store (REST/RPC backend) errors
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid caller input
    #[error("{0}")]
    Validation(String),

    /// Requested record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

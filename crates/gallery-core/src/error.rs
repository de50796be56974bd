//! Error types for gallery-core

use thiserror::Error;

/// Result type alias using gallery-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gallery-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

//! Common error types for WSA

use thiserror::Error;

/// Common result type for WSA operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across WSA crates
#[derive(Error, Debug)]
pub enum Error {
    /// Tabular store rejected the request (non-2xx response)
    #[error("Store error ({status}): {message}")]
    Store { status: u16, message: String },

    /// HTTP transport error talking to the store (wraps reqwest::Error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Row (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

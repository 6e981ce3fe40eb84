use thiserror::Error;

/// Main error type for kinmatch
#[derive(Error, Debug)]
pub enum KinmatchError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Person not found (seeker or relationship endpoint)
    #[error("Person not found: {0}")]
    PersonNotFound(String),

    /// Invalid request input (bad gender code, inverted ranges, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal failures (blocking task join, ...)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenient Result type using KinmatchError
pub type Result<T> = std::result::Result<T, KinmatchError>;

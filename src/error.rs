//! Error types for Academia.

use thiserror::Error;

/// Common error type for Academia.
#[derive(Error, Debug)]
pub enum AcademiaError {
    /// Database error.
    ///
    /// Raised when the metadata store rejects or fails a query.
    /// Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Object storage error (upload, download or delete failed).
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for AcademiaError {
    fn from(e: sqlx::Error) -> Self {
        AcademiaError::Database(e.to_string())
    }
}

impl From<reqwest::Error> for AcademiaError {
    fn from(e: reqwest::Error) -> Self {
        AcademiaError::Storage(e.to_string())
    }
}

/// Result type alias for Academia operations.
pub type Result<T> = std::result::Result<T, AcademiaError>;

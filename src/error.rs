//! Error types for Bookshelf.

use thiserror::Error;

/// Common error type for Bookshelf.
#[derive(Error, Debug)]
pub enum BookshelfError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Metadata file could not be encoded or decoded.
    ///
    /// JSON errors from serde_json are automatically converted.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A filename that cannot be stored under the upload directory.
    #[error("invalid file name: {0}")]
    InvalidName(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for BookshelfError {
    fn from(e: serde_json::Error) -> Self {
        BookshelfError::Metadata(e.to_string())
    }
}

/// Result type alias for Bookshelf operations.
pub type Result<T> = std::result::Result<T, BookshelfError>;

//! Error types for Quarry.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for Quarry operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias using Quarry's Error.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for the ingestion pipeline.

use crate::extract::{INVALID_EPUB_PREFIX, UNSUPPORTED_REASON};
use quarry_core::MediaType;
use thiserror::Error;

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can occur during ingestion.
#[derive(Error, Debug)]
pub enum IngestError {
    /// No extractor exists for the source's media type, named by its MIME string.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// EPUB structural prerequisites are missing.
    #[error("{0}")]
    InvalidContainer(String),

    /// The execution context became unusable.
    #[error("Execution fault: {0}")]
    ExecutionFault(String),

    #[error("Processing cancelled")]
    Cancelled,

    /// An extractor failed for any other reason.
    #[error("{0}")]
    Unknown(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] quarry_config::ConfigError),

    #[error("{0}")]
    Validation(String),
}

/// Discriminant of [`IngestError`] for callers that branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedFormat,
    InvalidContainer,
    ExecutionFault,
    Cancelled,
    Unknown,
    Io,
    Config,
    Validation,
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            IngestError::InvalidContainer(_) => ErrorKind::InvalidContainer,
            IngestError::ExecutionFault(_) => ErrorKind::ExecutionFault,
            IngestError::Cancelled => ErrorKind::Cancelled,
            IngestError::Unknown(_) => ErrorKind::Unknown,
            IngestError::Io(_) => ErrorKind::Io,
            IngestError::Config(_) => ErrorKind::Config,
            IngestError::Validation(_) => ErrorKind::Validation,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, IngestError::Cancelled)
    }

    /// Classify the reason carried by a worker `error` message for a
    /// request of `media_type`.
    pub(crate) fn from_worker_reason(reason: String, media_type: MediaType) -> Self {
        if reason == UNSUPPORTED_REASON {
            IngestError::UnsupportedFormat(media_type.mime().to_string())
        } else if reason.starts_with(INVALID_EPUB_PREFIX) {
            IngestError::InvalidContainer(reason)
        } else {
            IngestError::Unknown(reason)
        }
    }
}

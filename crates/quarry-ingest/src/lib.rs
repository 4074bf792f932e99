//! Quarry Ingest - Document text extraction pipeline.
//!
//! This crate provides:
//! - Extractors for plain text, PDF and EPUB
//! - A one-shot execution context that runs an extractor off the caller's thread
//! - A dispatcher speaking the request/progress/terminal protocol with it
//! - The `ingest` entry point with progress reporting and cancellation

mod dispatcher;
mod error;
pub mod extract;
mod options;
mod orchestrator;
mod validate;
mod worker;

pub use dispatcher::Dispatcher;
pub use error::{ErrorKind, IngestError, IngestResult};
pub use extract::{ExtractError, ExtractResult, Extractor, ExtractorSet, ProgressSink};
pub use options::{EpubOptions, IngestOptions};
pub use orchestrator::{ingest, Ingestor};
pub use validate::validate_source;
pub use worker::{ContextState, ExecutionContext};

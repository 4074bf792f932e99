//! Quarry Core - Domain types and the worker message protocol.
//!
//! This crate provides:
//! - Supported media types and the `SourceFile` abstraction
//! - Text chunks and the request/progress/terminal messages
//! - A cloneable cancellation token

mod cancel;
mod error;
mod message;
mod source;
mod types;

pub use cancel::CancellationToken;
pub use error::{Error, Result};
pub use message::{Request, WorkerMessage};
pub use source::{FileSource, MemorySource, SourceFile};
pub use types::*;

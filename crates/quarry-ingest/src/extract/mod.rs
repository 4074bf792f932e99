//! Format-specific text extractors.

mod epub;
mod pdf;
mod text;

pub use epub::{html_to_text, EpubExtractor};
pub use pdf::PdfExtractor;
pub use text::{StreamDecoder, TextExtractor};

use crate::options::IngestOptions;
use quarry_core::{MediaType, Request, WorkerMessage};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Reason reported when a request has no matching extractor.
pub const UNSUPPORTED_REASON: &str = "Unsupported file type";

/// Prefix of every reason describing a malformed EPUB container.
pub const INVALID_EPUB_PREFIX: &str = "Invalid EPUB";

/// Result type for extractors.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors raised while extracting text inside an execution context.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Invalid EPUB: {0}")]
    InvalidContainer(String),

    #[error("Failed to read PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Failed to read archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to parse XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The receiving side went away; the work is no longer wanted.
    #[error("Extraction aborted")]
    Aborted,
}

/// Outbound progress channel handed to an extractor.
///
/// Reported fractions are clamped to `[0, 1]` and never go backwards.
pub struct ProgressSink {
    sender: UnboundedSender<WorkerMessage>,
    last: f64,
}

impl ProgressSink {
    pub fn new(sender: UnboundedSender<WorkerMessage>) -> Self {
        Self { sender, last: 0.0 }
    }

    /// Emit a progress message.
    ///
    /// Fails with [`ExtractError::Aborted`] once the receiver is gone.
    pub fn report(&mut self, fraction: f64) -> ExtractResult<()> {
        let fraction = if fraction.is_nan() {
            self.last
        } else {
            fraction.clamp(0.0, 1.0).max(self.last)
        };
        self.last = fraction;
        self.sender
            .send(WorkerMessage::Progress { fraction })
            .map_err(|_| ExtractError::Aborted)
    }

    /// Report `done / total`, ignoring an empty total.
    pub fn report_ratio(&mut self, done: usize, total: usize) -> ExtractResult<()> {
        if total == 0 {
            return Ok(());
        }
        self.report(done as f64 / total as f64)
    }
}

/// Trait for format extractors.
pub trait Extractor: Send + Sync {
    /// Media type this extractor handles.
    fn media_type(&self) -> MediaType;

    /// Turn the request payload into plain text.
    fn extract(&self, request: Request, progress: &mut ProgressSink) -> ExtractResult<String>;
}

/// The extractors loaded into an execution context, keyed by media type.
#[derive(Clone, Default)]
pub struct ExtractorSet {
    extractors: HashMap<MediaType, Arc<dyn Extractor>>,
}

impl ExtractorSet {
    /// An empty set; every request is unsupported.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in text, PDF and EPUB extractors.
    pub fn standard(options: &IngestOptions) -> Self {
        Self::empty()
            .with(TextExtractor::new())
            .with(PdfExtractor::new())
            .with(EpubExtractor::new(options.epub.clone()))
    }

    /// Register an extractor, replacing any existing one for its media type.
    pub fn with(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractors
            .insert(extractor.media_type(), Arc::new(extractor));
        self
    }

    pub fn get(&self, media_type: MediaType) -> Option<&Arc<dyn Extractor>> {
        self.extractors.get(&media_type)
    }

    pub fn supports(&self, media_type: MediaType) -> bool {
        self.extractors.contains_key(&media_type)
    }
}

impl std::fmt::Debug for ExtractorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.extractors.keys().collect();
        kinds.sort();
        f.debug_struct("ExtractorSet").field("kinds", &kinds).finish()
    }
}

//! Public entry point for turning a document into plain text.

use crate::dispatcher::Dispatcher;
use crate::error::IngestResult;
use crate::extract::ExtractorSet;
use crate::options::IngestOptions;
use quarry_config::Config;
use quarry_core::{CancellationToken, SourceFile};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Extract the text of `file` using the default options.
///
/// Progress fractions are passed to `on_progress` in non-decreasing order.
/// Raising `cancel` before the text is ready fails the call with
/// [`IngestError::Cancelled`](crate::IngestError::Cancelled). An empty string
/// means the document holds no extractable prose.
///
/// The source is read on the blocking pool, so it is taken by value; pass an
/// `Arc` to keep using it afterwards.
pub async fn ingest<S, F>(
    file: S,
    on_progress: F,
    cancel: &CancellationToken,
) -> IngestResult<String>
where
    S: SourceFile + 'static,
    F: FnMut(f64) + Send,
{
    Ingestor::default().ingest(file, on_progress, cancel).await
}

/// Runs ingestion calls with a fixed set of options and extractors.
#[derive(Debug, Clone)]
pub struct Ingestor {
    options: IngestOptions,
    extractors: Arc<ExtractorSet>,
}

impl Ingestor {
    /// Create an ingestor with the built-in extractors.
    pub fn new(options: IngestOptions) -> Self {
        let extractors = ExtractorSet::standard(&options);
        Self::with_extractors(options, extractors)
    }

    /// Create an ingestor with a custom extractor set.
    pub fn with_extractors(options: IngestOptions, extractors: ExtractorSet) -> Self {
        Self {
            options,
            extractors: Arc::new(extractors),
        }
    }

    /// Create an ingestor from loaded configuration.
    pub fn from_config(config: &Config) -> IngestResult<Self> {
        config.validate()?;
        Ok(Self::new(IngestOptions::from_config(config)))
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Extract the text of `file`.
    ///
    /// One dispatcher, and so one execution context, is created per call and
    /// destroyed before this returns.
    pub async fn ingest<S, F>(
        &self,
        file: S,
        mut on_progress: F,
        cancel: &CancellationToken,
    ) -> IngestResult<String>
    where
        S: SourceFile + 'static,
        F: FnMut(f64) + Send,
    {
        let file: Arc<dyn SourceFile> = Arc::new(file);
        let span = info_span!(
            "ingest",
            call = %Uuid::new_v4(),
            media = file.media_type(),
            bytes = file.size_bytes()
        );

        async move {
            info!("Starting ingestion");
            let mut dispatcher =
                Dispatcher::new(Arc::clone(&self.extractors), self.options.clone());
            let result = dispatcher.run(file, &mut on_progress, cancel).await;
            dispatcher.teardown();

            match &result {
                Ok(text) => info!("Extracted {} characters", text.chars().count()),
                Err(e) if e.is_cancelled() => info!("Ingestion cancelled by caller"),
                Err(e) => warn!("Ingestion failed: {}", e),
            }
            result
        }
        .instrument(span)
        .await
    }
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(IngestOptions::default())
    }
}

//! Bridges one source file to one execution context.

use crate::error::{IngestError, IngestResult};
use crate::extract::ExtractorSet;
use crate::options::IngestOptions;
use crate::worker::ExecutionContext;
use quarry_core::{
    chunk_count, CancellationToken, Chunk, MediaType, Request, SourceFile, WorkerMessage,
};
use std::io;
use std::sync::Arc;
use tracing::{debug, info};

/// Owns the execution context for a single ingestion call.
pub struct Dispatcher {
    options: IngestOptions,
    extractors: Arc<ExtractorSet>,
    context: Option<ExecutionContext>,
}

impl Dispatcher {
    pub fn new(extractors: Arc<ExtractorSet>, options: IngestOptions) -> Self {
        Self {
            options,
            extractors,
            context: None,
        }
    }

    /// Whether an execution context is currently alive.
    pub fn is_active(&self) -> bool {
        self.context.is_some()
    }

    /// Extract text from `file`, forwarding progress to `on_progress`.
    ///
    /// The execution context is destroyed before this returns, whatever the
    /// outcome.
    pub async fn run(
        &mut self,
        file: Arc<dyn SourceFile>,
        on_progress: &mut (dyn FnMut(f64) + Send),
        cancel: &CancellationToken,
    ) -> IngestResult<String> {
        let result = self.dispatch(file, on_progress, cancel).await;
        self.teardown();
        result
    }

    async fn dispatch(
        &mut self,
        file: Arc<dyn SourceFile>,
        on_progress: &mut (dyn FnMut(f64) + Send),
        cancel: &CancellationToken,
    ) -> IngestResult<String> {
        let media_type = MediaType::from_mime(file.media_type())
            .ok_or_else(|| IngestError::UnsupportedFormat(file.media_type().to_string()))?;

        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        let request = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Ingestion cancelled while reading the source");
                return Err(IngestError::Cancelled);
            }
            request = build_request(&file, media_type, self.options.chunk_size) => request?,
        };
        debug!(
            "Dispatching {} request ({} bytes)",
            media_type.as_str(),
            request.payload_len()
        );

        let context = self
            .context
            .insert(ExecutionContext::spawn(Arc::clone(&self.extractors)));
        context.send(request)?;

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                message = context.recv() => Some(message),
            };

            match event {
                None => {
                    info!("Ingestion cancelled");
                    return Err(IngestError::Cancelled);
                }
                Some(Some(WorkerMessage::Progress { fraction })) => on_progress(fraction),
                Some(Some(WorkerMessage::Complete { text })) => return Ok(text),
                Some(Some(WorkerMessage::Error { reason })) => {
                    return Err(IngestError::from_worker_reason(reason, media_type));
                }
                Some(None) => {
                    let reason = context.fault_reason().await;
                    return Err(IngestError::ExecutionFault(reason));
                }
            }
        }
    }

    /// Destroy the execution context, if any. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if let Some(mut context) = self.context.take() {
            context.shutdown();
            debug!("Execution context destroyed");
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Read the source into the request expected by the worker.
///
/// Plain text is split into `chunk_size` chunks; other formats are read whole.
/// Every read runs on the blocking pool.
async fn build_request(
    file: &Arc<dyn SourceFile>,
    media_type: MediaType,
    chunk_size: usize,
) -> IngestResult<Request> {
    match media_type {
        MediaType::PlainText => {
            let chunk_size = chunk_size.max(1);
            let size = file.size_bytes();
            let mut chunks = Vec::with_capacity(chunk_count(size, chunk_size));
            let mut offset = 0u64;

            while offset < size {
                let bytes =
                    read_blocking(file, move |f| f.read_range(offset, chunk_size)).await?;
                if bytes.is_empty() {
                    break;
                }
                let len = bytes.len() as u64;
                chunks.push(Chunk::new(chunks.len(), offset, bytes));
                offset += len;
            }

            Ok(Request::Text { chunks })
        }
        MediaType::Pdf => Ok(Request::Pdf {
            buffer: read_blocking(file, |f| f.read_all()).await?,
        }),
        MediaType::Epub => Ok(Request::Epub {
            buffer: read_blocking(file, |f| f.read_all()).await?,
        }),
    }
}

async fn read_blocking<F>(file: &Arc<dyn SourceFile>, read: F) -> IngestResult<Vec<u8>>
where
    F: FnOnce(&dyn SourceFile) -> io::Result<Vec<u8>> + Send + 'static,
{
    let file = Arc::clone(file);
    let bytes = tokio::task::spawn_blocking(move || read(&*file))
        .await
        .map_err(|e| IngestError::ExecutionFault(format!("source read failed: {}", e)))??;
    Ok(bytes)
}

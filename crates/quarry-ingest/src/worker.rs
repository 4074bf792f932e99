//! The execution context: an isolated worker serving exactly one request.
//!
//! The worker runs on the blocking thread pool and talks to its owner only
//! through channels. It moves through `Idle -> Running -> Terminated` and is
//! never reused.

use crate::error::{IngestError, IngestResult};
use crate::extract::{ExtractError, ExtractorSet, ProgressSink, UNSUPPORTED_REASON};
use quarry_core::{Request, WorkerMessage};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Lifecycle of an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Waiting for its request.
    Idle,
    /// Request received; progress may follow.
    Running,
    /// Terminal message observed, or shut down.
    Terminated,
}

/// Handle to a worker that extracts text from one request.
pub struct ExecutionContext {
    state: ContextState,
    request_tx: Option<oneshot::Sender<Request>>,
    messages: Option<UnboundedReceiver<WorkerMessage>>,
    handle: Option<JoinHandle<()>>,
}

impl ExecutionContext {
    /// Start a worker with the given extractors loaded.
    pub fn spawn(extractors: Arc<ExtractorSet>) -> Self {
        let (request_tx, request_rx) = oneshot::channel();
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let span = tracing::Span::current();

        let handle = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            serve(&extractors, request_rx, message_tx);
        });

        Self {
            state: ContextState::Idle,
            request_tx: Some(request_tx),
            messages: Some(message_rx),
            handle: Some(handle),
        }
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Hand the single request to the worker.
    pub fn send(&mut self, request: Request) -> IngestResult<()> {
        if self.state != ContextState::Idle {
            return Err(IngestError::ExecutionFault(
                "execution context already received a request".to_string(),
            ));
        }
        let request_tx = self.request_tx.take().ok_or_else(|| {
            IngestError::ExecutionFault("execution context is not accepting requests".to_string())
        })?;
        request_tx.send(request).map_err(|_| {
            self.state = ContextState::Terminated;
            IngestError::ExecutionFault("execution context stopped before the request".to_string())
        })?;
        self.state = ContextState::Running;
        Ok(())
    }

    /// Receive the next message.
    ///
    /// Returns `None` once the context has terminated, or if the worker went
    /// away without a terminal message.
    pub async fn recv(&mut self) -> Option<WorkerMessage> {
        if self.state == ContextState::Terminated {
            return None;
        }
        let message = self.messages.as_mut()?.recv().await;
        match &message {
            Some(m) if !m.is_terminal() => {}
            _ => self.state = ContextState::Terminated,
        }
        message
    }

    /// Describe why the worker stopped without a terminal message.
    pub async fn fault_reason(&mut self) -> String {
        let Some(handle) = self.handle.take() else {
            return "worker is no longer available".to_string();
        };
        match handle.await {
            Ok(()) => "worker exited without a result".to_string(),
            Err(e) if e.is_panic() => {
                let payload = e.into_panic();
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                format!("worker panicked: {}", detail)
            }
            Err(e) => format!("worker failed: {}", e),
        }
    }

    /// Destroy the context. Safe to call more than once.
    ///
    /// A worker still running sees its channel closed at the next progress
    /// report and stops.
    pub fn shutdown(&mut self) {
        self.request_tx = None;
        if let Some(mut messages) = self.messages.take() {
            messages.close();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.state = ContextState::Terminated;
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker body: wait for the request, run the matching extractor, emit
/// exactly one terminal message.
fn serve(
    extractors: &ExtractorSet,
    request_rx: oneshot::Receiver<Request>,
    message_tx: UnboundedSender<WorkerMessage>,
) {
    let Ok(request) = request_rx.blocking_recv() else {
        debug!("Execution context closed before receiving a request");
        return;
    };

    let media_type = request.media_type();
    debug!(
        "Worker received {} request ({} bytes)",
        media_type.as_str(),
        request.payload_len()
    );

    let terminal = match extractors.get(media_type) {
        None => WorkerMessage::Error {
            reason: UNSUPPORTED_REASON.to_string(),
        },
        Some(extractor) => {
            let mut progress = ProgressSink::new(message_tx.clone());
            match extractor.extract(request, &mut progress) {
                Ok(text) => WorkerMessage::Complete { text },
                Err(ExtractError::Aborted) => {
                    debug!("Extraction aborted by the dispatcher");
                    return;
                }
                Err(e) => {
                    warn!("Extraction failed: {}", e);
                    WorkerMessage::Error {
                        reason: e.to_string(),
                    }
                }
            }
        }
    };

    if message_tx.send(terminal).is_err() {
        debug!("Dispatcher went away before the terminal message");
    }
}

//! Completion callback contracts.
//!
//! Building a response and physically writing it are separate events that may
//! happen on different tasks. Two callbacks bridge them:
//!
//! ```text
//! Pipeline ── response_ready(descriptor, status) ──▶ Transport
//!                                                      │ writes asynchronously
//! Pipeline ◀── status.response_send_successfully() ────┤
//!          ◀── status.response_send_failure(error) ────┘
//!     │
//!     └── completion.sent_successfully(ctx) / sent_with_failure(error, ctx) ──▶ upstream
//! ```
//!
//! Both callbacks are consumed by value, so each fires at most once. A status
//! callback dropped without reporting counts as a failed send.

use std::fmt;

use thiserror::Error;
use tokio::sync::oneshot;

use crate::http::response::ResponseDescriptor;
use crate::pipeline::context::{RequestContext, RequestId};

/// Why a response could not be written.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("I/O error writing response: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed before the response was fully written")]
    ConnectionClosed,

    #[error("transport dropped the status callback without reporting an outcome")]
    Abandoned,

    #[error("{0}")]
    Other(String),
}

type StatusFn = Box<dyn FnOnce(Result<(), SendError>) + Send>;

/// Transport-facing half: reports the outcome of the physical write.
pub struct ResponseStatusCallback {
    on_status: Option<StatusFn>,
}

impl ResponseStatusCallback {
    pub fn new<F>(on_status: F) -> Self
    where
        F: FnOnce(Result<(), SendError>) + Send + 'static,
    {
        Self {
            on_status: Some(Box::new(on_status)),
        }
    }

    pub fn response_send_successfully(mut self) {
        self.fire(Ok(()));
    }

    pub fn response_send_failure(mut self, error: SendError) {
        self.fire(Err(error));
    }

    fn fire(&mut self, result: Result<(), SendError>) {
        if let Some(on_status) = self.on_status.take() {
            on_status(result);
        }
    }
}

impl Drop for ResponseStatusCallback {
    fn drop(&mut self) {
        self.fire(Err(SendError::Abandoned));
    }
}

impl fmt::Debug for ResponseStatusCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStatusCallback")
            .field("pending", &self.on_status.is_some())
            .finish()
    }
}

/// The transport-write primitive. Must return without waiting for the write
/// and later resolve `status` exactly once, from any task or thread.
pub trait ResponseReadyCallback: Send {
    fn response_ready(self, response: ResponseDescriptor, status: ResponseStatusCallback);
}

/// Upstream lifecycle notification, fired once the write of a processed or
/// failed request has concluded. Never fired for discarded requests.
pub trait ResponseCompletionCallback: Send + 'static {
    fn sent_successfully(self, ctx: RequestContext);
    fn sent_with_failure(self, error: SendError, ctx: RequestContext);
}

/// A failed write together with the context of the request.
#[derive(Debug, Error)]
#[error("response delivery failed: {error}")]
pub struct DeliveryFailure {
    #[source]
    pub error: SendError,
    pub context: RequestContext,
}

pub type CompletionReceiver = oneshot::Receiver<Result<RequestContext, DeliveryFailure>>;

/// Completion callback that resolves a oneshot, so callers can await the write.
#[derive(Debug)]
pub struct CompletionSender {
    tx: oneshot::Sender<Result<RequestContext, DeliveryFailure>>,
}

/// Create a completion callback and the future that resolves when it fires.
pub fn completion_channel() -> (CompletionSender, CompletionReceiver) {
    let (tx, rx) = oneshot::channel();
    (CompletionSender { tx }, rx)
}

impl ResponseCompletionCallback for CompletionSender {
    fn sent_successfully(self, ctx: RequestContext) {
        let _ = self.tx.send(Ok(ctx));
    }

    fn sent_with_failure(self, error: SendError, context: RequestContext) {
        let _ = self.tx.send(Err(DeliveryFailure { error, context }));
    }
}

/// Completion callback that only logs the outcome.
#[derive(Debug, Clone)]
pub struct LoggingCompletion {
    request_id: RequestId,
}

impl LoggingCompletion {
    pub fn new(request_id: RequestId) -> Self {
        Self { request_id }
    }
}

impl ResponseCompletionCallback for LoggingCompletion {
    fn sent_successfully(self, ctx: RequestContext) {
        tracing::debug!(
            request_id = %self.request_id,
            elapsed_ms = ctx.received_at().elapsed().as_millis() as u64,
            "Response sent"
        );
    }

    fn sent_with_failure(self, error: SendError, ctx: RequestContext) {
        tracing::warn!(
            request_id = %self.request_id,
            state = %ctx.state(),
            error = %error,
            "Response send failed"
        );
    }
}

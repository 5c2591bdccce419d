//! The response pipeline.
//!
//! # Responsibilities
//! - Gate every request through the admission controller
//! - Route admitted requests through the processing chain exactly once
//! - Turn the outcome into exactly one response descriptor
//! - Hand the descriptor to the transport without waiting for the write
//! - Translate the write outcome into the upstream completion signal
//! - Feed the endpoint statistics
//!
//! # Data Flow
//! ```text
//! RequestContext (Received)
//!     → admit ──refused──▶ discard response ──▶ deliver (outcome only logged)
//!     → route (Processing)
//!         → Ok      → success mapper ─┐
//!         → Failure → error mapper  ──┴▶ deliver ──▶ completion callback
//! ```
//!
//! # Design Decisions
//! - Admission is a hard gate: refused requests never reach the chain
//! - Chain errors and panics stop at `route`; they become 500 responses
//! - No retries at this layer for any failure

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::http::StatusCode;
use futures_util::FutureExt;

use crate::clock::{Clock, SystemClock};
use crate::config::PipelineConfig;
use crate::http::builder::{ResponseBuilder, ResponseSource};
use crate::http::response::ResponseDescriptor;
use crate::observability::metrics;
use crate::pipeline::callback::{
    ResponseCompletionCallback, ResponseReadyCallback, ResponseStatusCallback,
};
use crate::pipeline::context::RequestContext;
use crate::pipeline::state::PipelineState;
use crate::processing::{MessageProcessor, ProcessingError};
use crate::statistics::FlowStatistics;
use crate::throttling::{AdmissionController, ThrottlingDecision};

/// Statistics kind reported for pipelines fronting an HTTP listener.
pub const ENDPOINT_KIND: &str = "http-listener";

/// Result of routing a request through the processing chain.
#[derive(Debug)]
pub enum CompletionOutcome {
    Ok(RequestContext),
    Failure(ProcessingError, RequestContext),
}

/// Which branch of the pipeline a request took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Refused by admission control; a discard response was handed to the transport.
    Discarded,
    /// Processed successfully; a mapped response was handed to the transport.
    Processed,
    /// Processing failed; a 500 response was handed to the transport.
    Failed,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Discarded => "discarded",
            Disposition::Processed => "processed",
            Disposition::Failed => "failed",
        }
    }
}

/// Per-endpoint response pipeline. Shared by all in-flight requests.
pub struct ResponsePipeline {
    admission: AdmissionController,
    chain: Arc<dyn MessageProcessor>,
    responses: ResponseBuilder,
    statistics: Arc<FlowStatistics>,
}

impl ResponsePipeline {
    pub fn new(
        admission: AdmissionController,
        chain: Arc<dyn MessageProcessor>,
        responses: ResponseBuilder,
        statistics: Arc<FlowStatistics>,
    ) -> Self {
        Self {
            admission,
            chain,
            responses,
            statistics,
        }
    }

    /// Wire a pipeline from configuration with the default response mappers.
    pub fn from_config(config: &PipelineConfig, chain: Arc<dyn MessageProcessor>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let admission = AdmissionController::from_config(&config.throttling, clock.clone());
        let discard_status = StatusCode::from_u16(config.throttling.discard_status_code)
            .unwrap_or(StatusCode::TOO_MANY_REQUESTS);
        let responses = ResponseBuilder::default().with_discard_status(discard_status);
        let statistics = Arc::new(FlowStatistics::with_clock(
            ENDPOINT_KIND,
            config.statistics.name.as_str(),
            clock,
        ));
        statistics.set_enabled(config.statistics.enabled);

        Self::new(admission, chain, responses, statistics)
    }

    pub fn statistics(&self) -> &Arc<FlowStatistics> {
        &self.statistics
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    /// Run one request through the whole pipeline.
    ///
    /// Returns as soon as the response has been handed to `transport`; the
    /// write outcome arrives later through `completion` (never for discarded
    /// requests, whose outcome is only logged).
    pub async fn process<T, C>(&self, mut ctx: RequestContext, transport: T, completion: C) -> Disposition
    where
        T: ResponseReadyCallback,
        C: ResponseCompletionCallback,
    {
        let record = self.statistics.is_enabled();
        if record {
            self.statistics.inc_received_events();
        }

        let decision = self.admit(&mut ctx);
        if !decision.allowed {
            tracing::debug!(
                request_id = %ctx.id(),
                limit = decision.limit,
                reset_in_ms = decision.reset_in_millis,
                "Request refused by admission control"
            );
            metrics::record_throttled();
            let response = self.responses.discard(&decision);
            deliver_discard(ctx, response, transport);
            return Disposition::Discarded;
        }

        let (ctx, response, disposition) = match self.route(ctx).await {
            CompletionOutcome::Ok(mut ctx) => {
                match self.responses.build(ResponseSource::Completed(&ctx), &decision) {
                    Ok(response) => (ctx, response, Disposition::Processed),
                    Err(error) => {
                        tracing::warn!(request_id = %ctx.id(), error = %error, "Response mapping failed");
                        ctx.transition(PipelineState::CompletedError);
                        let response = self.failure_response(&error, &ctx, &decision, record);
                        (ctx, response, Disposition::Failed)
                    }
                }
            }
            CompletionOutcome::Failure(error, ctx) => {
                tracing::warn!(
                    request_id = %ctx.id(),
                    fatal = error.is_fatal(),
                    error = %error,
                    "Processing chain failed"
                );
                let response = self.failure_response(&error, &ctx, &decision, record);
                (ctx, response, Disposition::Failed)
            }
        };

        self.deliver(ctx, response, disposition, transport, completion, record);
        disposition
    }

    /// Consult the admission controller and move the context to `Admitted` or `Rejected`.
    pub fn admit(&self, ctx: &mut RequestContext) -> ThrottlingDecision {
        let decision = self.admission.decide();
        ctx.transition(if decision.allowed {
            PipelineState::Admitted
        } else {
            PipelineState::Rejected
        });
        decision
    }

    /// Invoke the processing chain once. Errors and panics are captured here
    /// and never propagate further.
    pub async fn route(&self, mut ctx: RequestContext) -> CompletionOutcome {
        ctx.transition(PipelineState::Processing);
        let fallback = ctx.detached();

        // Building the future runs processor code too, so it happens inside the guard.
        let invocation = async move { self.chain.process(ctx).await };
        match AssertUnwindSafe(invocation).catch_unwind().await {
            Ok(Ok(mut ctx)) => {
                ctx.transition(PipelineState::CompletedOk);
                CompletionOutcome::Ok(ctx)
            }
            Ok(Err(failure)) => {
                let mut ctx = failure.context;
                ctx.transition(PipelineState::CompletedError);
                CompletionOutcome::Failure(failure.error, ctx)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(request_id = %fallback.id(), panic = %message, "Processor panicked");
                let mut ctx = fallback;
                ctx.transition(PipelineState::CompletedError);
                CompletionOutcome::Failure(
                    ProcessingError::fatal(format!("processor panicked: {message}")),
                    ctx,
                )
            }
        }
    }

    fn failure_response(
        &self,
        error: &ProcessingError,
        ctx: &RequestContext,
        decision: &ThrottlingDecision,
        record: bool,
    ) -> ResponseDescriptor {
        if record {
            if error.is_fatal() {
                self.statistics.inc_fatal_error();
            } else {
                self.statistics.inc_execution_error();
            }
        }
        self.responses.failure(error, ctx, decision)
    }

    fn deliver<T, C>(
        &self,
        mut ctx: RequestContext,
        response: ResponseDescriptor,
        disposition: Disposition,
        transport: T,
        completion: C,
        record: bool,
    ) where
        T: ResponseReadyCallback,
        C: ResponseCompletionCallback,
    {
        ctx.transition(PipelineState::Delivering);
        let statistics = self.statistics.clone();
        let status_code = response.status().as_u16();

        let status = ResponseStatusCallback::new(move |result| {
            let elapsed = ctx.received_at().elapsed();
            if record {
                statistics.add_complete_execution_time(elapsed.as_millis() as u64);
            }
            metrics::record_request(disposition.as_str(), status_code, elapsed);

            match result {
                Ok(()) => {
                    ctx.transition(PipelineState::Sent);
                    completion.sent_successfully(ctx);
                }
                Err(error) => {
                    ctx.transition(PipelineState::SendFailed);
                    metrics::record_send_failure("response");
                    completion.sent_with_failure(error, ctx);
                }
            }
        });

        transport.response_ready(response, status);
    }
}

impl std::fmt::Debug for ResponsePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponsePipeline")
            .field("admission", &self.admission)
            .field("responses", &self.responses)
            .field("statistics", &self.statistics.name())
            .finish_non_exhaustive()
    }
}

/// Hand a discard response to the transport. Nothing upstream waits on a
/// refused request, so the write outcome is only logged.
fn deliver_discard<T>(mut ctx: RequestContext, response: ResponseDescriptor, transport: T)
where
    T: ResponseReadyCallback,
{
    ctx.transition(PipelineState::Delivering);
    let status = ResponseStatusCallback::new(move |result| match result {
        Ok(()) => {
            ctx.transition(PipelineState::Sent);
            tracing::debug!(request_id = %ctx.id(), "Throttled response sent successfully");
        }
        Err(error) => {
            ctx.transition(PipelineState::SendFailed);
            metrics::record_send_failure("discard");
            tracing::info!(request_id = %ctx.id(), error = %error, "Failure sending throttled response");
            tracing::debug!(request_id = %ctx.id(), error = ?error, "Throttled response send failure detail");
        }
    });
    transport.response_ready(response, status);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

//! Response construction for every pipeline outcome.
//!
//! # Responsibilities
//! - Completed: delegate shaping to the success mapper
//! - Failed: fixed `500 Internal Server Error`, body from the error mapper
//! - Rejected: fixed discard response with all three rate-limit headers
//!
//! # Design Decisions
//! - Pure: no I/O, no counters, same input gives same descriptor
//! - Rate-limit headers are written last so mappers cannot clobber them
//! - Headers are only attached when the decision carries a real limit

use std::sync::Arc;

use axum::http::StatusCode;

use crate::http::mapping::{
    ContextResponseMapper, ErrorResponseMapper, PlainTextErrorMapper, ResponseMapper,
};
use crate::http::response::{ResponseDescriptor, ResponseDescriptorBuilder};
use crate::pipeline::context::RequestContext;
use crate::processing::ProcessingError;
use crate::throttling::ThrottlingDecision;

pub const DISCARD_REASON_PHRASE: &str = "Too Many Requests";
pub const DISCARD_BODY: &str = "API calls exceeded";
pub const ERROR_REASON_PHRASE: &str = "Internal Server Error";

/// What the response is being built from.
#[derive(Debug)]
pub enum ResponseSource<'a> {
    Completed(&'a RequestContext),
    Failed(&'a ProcessingError, &'a RequestContext),
    Rejected,
}

/// Maps pipeline outcomes to response descriptors.
#[derive(Clone)]
pub struct ResponseBuilder {
    discard_status: StatusCode,
    success: Arc<dyn ResponseMapper>,
    error: Arc<dyn ErrorResponseMapper>,
}

impl ResponseBuilder {
    pub fn new(
        discard_status: StatusCode,
        success: Arc<dyn ResponseMapper>,
        error: Arc<dyn ErrorResponseMapper>,
    ) -> Self {
        Self {
            discard_status,
            success,
            error,
        }
    }

    pub fn with_discard_status(mut self, status: StatusCode) -> Self {
        self.discard_status = status;
        self
    }

    pub fn discard_status(&self) -> StatusCode {
        self.discard_status
    }

    /// Build the response for `source`. Only the success mapper can fail; the
    /// caller is expected to fall back to [`ResponseSource::Failed`] in that case.
    pub fn build(
        &self,
        source: ResponseSource<'_>,
        decision: &ThrottlingDecision,
    ) -> Result<ResponseDescriptor, ProcessingError> {
        let response = match source {
            ResponseSource::Completed(ctx) => self
                .success
                .map(ctx, ResponseDescriptorBuilder::new(StatusCode::OK))?,
            ResponseSource::Failed(error, ctx) => return Ok(self.failure(error, ctx, decision)),
            ResponseSource::Rejected => return Ok(self.discard(decision)),
        };
        Ok(with_throttling_headers(response, decision).build())
    }

    /// The `500 Internal Server Error` response for a failed request.
    pub fn failure(
        &self,
        error: &ProcessingError,
        ctx: &RequestContext,
        decision: &ThrottlingDecision,
    ) -> ResponseDescriptor {
        let response = self
            .error
            .map(error, ctx, ResponseDescriptorBuilder::new(StatusCode::INTERNAL_SERVER_ERROR))
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .reason_phrase(ERROR_REASON_PHRASE);
        with_throttling_headers(response, decision).build()
    }

    /// The fixed discard response. Always carries the rate-limit headers.
    pub fn discard(&self, decision: &ThrottlingDecision) -> ResponseDescriptor {
        let mut response = ResponseDescriptorBuilder::new(self.discard_status)
            .reason_phrase(DISCARD_REASON_PHRASE)
            .body(DISCARD_BODY);
        for (name, value) in decision.headers() {
            response = response.header(name, value);
        }
        response.build()
    }
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            Arc::new(ContextResponseMapper),
            Arc::new(PlainTextErrorMapper),
        )
    }
}

impl std::fmt::Debug for ResponseBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseBuilder")
            .field("discard_status", &self.discard_status)
            .finish_non_exhaustive()
    }
}

fn with_throttling_headers(
    mut response: ResponseDescriptorBuilder,
    decision: &ThrottlingDecision,
) -> ResponseDescriptorBuilder {
    if decision.is_limited() {
        for (name, value) in decision.headers() {
            response = response.header(name, value);
        }
    }
    response
}

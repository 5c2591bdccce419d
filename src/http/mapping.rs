//! Response mapping collaborators.
//!
//! The pipeline decides *which* kind of response to send; these traits decide
//! what a successful or failed processing result looks like on the wire.
//! Both receive a builder already primed by the pipeline and return it shaped.

use axum::http::{header, HeaderValue, StatusCode};

use crate::http::response::ResponseDescriptorBuilder;
use crate::pipeline::context::RequestContext;
use crate::processing::ProcessingError;

/// Shapes the response of a successfully processed request.
pub trait ResponseMapper: Send + Sync {
    fn map(
        &self,
        ctx: &RequestContext,
        response: ResponseDescriptorBuilder,
    ) -> Result<ResponseDescriptorBuilder, ProcessingError>;
}

/// Shapes the body of a failed request. Status and reason phrase are fixed by
/// the pipeline and re-applied after mapping.
pub trait ErrorResponseMapper: Send + Sync {
    fn map(
        &self,
        error: &ProcessingError,
        ctx: &RequestContext,
        response: ResponseDescriptorBuilder,
    ) -> ResponseDescriptorBuilder;
}

/// Uses whatever status, headers and payload the processors left on the context.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContextResponseMapper;

impl ResponseMapper for ContextResponseMapper {
    fn map(
        &self,
        ctx: &RequestContext,
        response: ResponseDescriptorBuilder,
    ) -> Result<ResponseDescriptorBuilder, ProcessingError> {
        Ok(response
            .status(ctx.response_status().unwrap_or(StatusCode::OK))
            .headers(ctx.response_headers().clone())
            .body(ctx.payload().clone()))
    }
}

/// Plain-text body carrying the error message.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextErrorMapper;

impl ErrorResponseMapper for PlainTextErrorMapper {
    fn map(
        &self,
        error: &ProcessingError,
        _ctx: &RequestContext,
        response: ResponseDescriptorBuilder,
    ) -> ResponseDescriptorBuilder {
        response
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            )
            .body(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Uri};

    #[test]
    fn context_mapper_defaults_to_ok() {
        let ctx = RequestContext::new(Method::GET, Uri::from_static("/")).with_payload("hi");
        let response = ContextResponseMapper
            .map(&ctx, ResponseDescriptorBuilder::new(StatusCode::OK))
            .unwrap()
            .build();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"hi");
    }

    #[test]
    fn context_mapper_uses_processor_status() {
        let mut ctx = RequestContext::new(Method::POST, Uri::from_static("/"));
        ctx.set_response_status(StatusCode::CREATED);
        let response = ContextResponseMapper
            .map(&ctx, ResponseDescriptorBuilder::new(StatusCode::OK))
            .unwrap()
            .build();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.reason_phrase(), "Created");
    }

    #[test]
    fn plain_text_error_body() {
        let ctx = RequestContext::new(Method::GET, Uri::from_static("/"));
        let err = ProcessingError::execution("bad input");
        let response = PlainTextErrorMapper
            .map(&err, &ctx, ResponseDescriptorBuilder::new(StatusCode::INTERNAL_SERVER_ERROR))
            .build();
        assert_eq!(response.body().as_ref(), b"execution error: bad input");
        assert_eq!(response.header("content-type"), Some("text/plain; charset=utf-8"));
    }
}

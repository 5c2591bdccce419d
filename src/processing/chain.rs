//! Processor trait and composition.

use std::future::Future;
use std::sync::Arc;

use axum::http::{header, StatusCode};
use futures_util::future::{BoxFuture, FutureExt};

use crate::pipeline::context::RequestContext;
use crate::processing::error::ProcessingFailure;

/// A step of the processing chain.
///
/// Takes ownership of the context and hands it back on success, or inside a
/// [`ProcessingFailure`] on error, so the pipeline always gets the context back.
pub trait MessageProcessor: Send + Sync {
    fn process(&self, ctx: RequestContext) -> BoxFuture<'_, Result<RequestContext, ProcessingFailure>>;
}

/// Runs processors in order, stopping at the first failure.
#[derive(Clone, Default)]
pub struct ProcessorChain {
    processors: Vec<Arc<dyn MessageProcessor>>,
}

impl ProcessorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then<P>(mut self, processor: P) -> Self
    where
        P: MessageProcessor + 'static,
    {
        self.processors.push(Arc::new(processor));
        self
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl std::fmt::Debug for ProcessorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorChain")
            .field("processors", &self.processors.len())
            .finish()
    }
}

impl MessageProcessor for ProcessorChain {
    fn process(&self, ctx: RequestContext) -> BoxFuture<'_, Result<RequestContext, ProcessingFailure>> {
        async move {
            let mut ctx = ctx;
            for processor in &self.processors {
                ctx = processor.process(ctx).await?;
            }
            Ok(ctx)
        }
        .boxed()
    }
}

/// Adapts an async closure into a processor.
pub struct FnProcessor<F> {
    f: F,
}

/// Build a processor from `async fn(RequestContext) -> Result<RequestContext, ProcessingFailure>`.
pub fn process_fn<F, Fut>(f: F) -> FnProcessor<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RequestContext, ProcessingFailure>> + Send + 'static,
{
    FnProcessor { f }
}

impl<F, Fut> MessageProcessor for FnProcessor<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RequestContext, ProcessingFailure>> + Send + 'static,
{
    fn process(&self, ctx: RequestContext) -> BoxFuture<'_, Result<RequestContext, ProcessingFailure>> {
        (self.f)(ctx).boxed()
    }
}

/// Answers with the inbound payload and content type.
#[derive(Debug, Default, Clone, Copy)]
pub struct Echo;

impl MessageProcessor for Echo {
    fn process(&self, mut ctx: RequestContext) -> BoxFuture<'_, Result<RequestContext, ProcessingFailure>> {
        if let Some(content_type) = ctx.headers().get(header::CONTENT_TYPE).cloned() {
            ctx.response_headers_mut().insert(header::CONTENT_TYPE, content_type);
        }
        ctx.set_response_status(StatusCode::OK);
        futures_util::future::ready(Ok(ctx)).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::error::ProcessingError;
    use axum::http::{HeaderValue, Method, Uri};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx() -> RequestContext {
        RequestContext::new(Method::POST, Uri::from_static("/orders")).with_payload("hello")
    }

    #[tokio::test]
    async fn chain_runs_in_order() {
        let chain = ProcessorChain::new()
            .then(process_fn(|mut ctx: RequestContext| async move {
                ctx.set_attribute("step", "1");
                Ok(ctx)
            }))
            .then(process_fn(|mut ctx: RequestContext| async move {
                let prev = ctx.attribute("step").unwrap_or_default().to_string();
                ctx.set_attribute("step", format!("{prev}2"));
                Ok(ctx)
            }));

        let out = chain.process(ctx()).await.unwrap();
        assert_eq!(out.attribute("step"), Some("12"));
    }

    #[tokio::test]
    async fn chain_stops_at_first_failure() {
        let reached = Arc::new(AtomicUsize::new(0));
        let counter = reached.clone();
        let chain = ProcessorChain::new()
            .then(process_fn(|ctx: RequestContext| async move {
                Err(ProcessingFailure::new(ProcessingError::execution("boom"), ctx))
            }))
            .then(process_fn(move |ctx: RequestContext| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok(ctx) }
            }));

        let failure = chain.process(ctx()).await.unwrap_err();
        assert!(!failure.error.is_fatal());
        assert_eq!(failure.context.payload().as_ref(), b"hello");
        assert_eq!(reached.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn echo_copies_content_type() {
        let input = ctx().with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let out = Echo.process(input).await.unwrap();
        assert_eq!(out.response_status(), Some(StatusCode::OK));
        assert_eq!(out.response_headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(out.payload().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn empty_chain_passes_through() {
        let chain = ProcessorChain::new();
        assert!(chain.is_empty());
        assert!(chain.process(ctx()).await.is_ok());
    }
}

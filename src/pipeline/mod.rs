//! Request/response pipeline.
//!
//! # Data Flow
//! ```text
//! Transport adapter
//!     → context.rs (RequestContext, state Received)
//!     → engine.rs (admit → route → build response)
//!     → callback.rs (hand off to transport, await write outcome)
//!     → upstream completion callback
//! ```
//!
//! # Design Decisions
//! - One pipeline per endpoint, shared across all in-flight requests
//! - Each request walks the state machine in state.rs exactly once

pub mod callback;
pub mod context;
pub mod engine;
pub mod state;

pub use callback::{
    completion_channel, CompletionReceiver, CompletionSender, DeliveryFailure, LoggingCompletion,
    ResponseCompletionCallback, ResponseReadyCallback, ResponseStatusCallback, SendError,
};
pub use context::{RequestContext, RequestId, X_REQUEST_ID};
pub use engine::{CompletionOutcome, Disposition, ResponsePipeline, ENDPOINT_KIND};
pub use state::PipelineState;

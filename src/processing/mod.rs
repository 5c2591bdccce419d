//! Processing chain collaborators.
//!
//! # Data Flow
//! ```text
//! Admitted RequestContext
//!     → chain.rs (MessageProcessor steps, in order)
//!     → Ok(context)                    → success response mapping
//!     → Err(ProcessingFailure{error})  → error response mapping
//! ```
//!
//! # Design Decisions
//! - Processors own the context while they run and always hand it back
//! - Execution vs fatal classification belongs to the processor, not the pipeline

pub mod chain;
pub mod error;

pub use chain::{process_fn, Echo, FnProcessor, MessageProcessor, ProcessorChain};
pub use error::{BoxError, ProcessingError, ProcessingFailure};

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, body limit)
//!     → pipeline (admit, process, build)
//!         → builder.rs (pick the response for the outcome)
//!         → mapping.rs (success / error mappers)
//!         → response.rs (immutable descriptor)
//!     → transport.rs (descriptor → hyper response, write outcome → callback)
//!     → Send to client
//! ```

pub mod builder;
pub mod mapping;
pub mod response;
pub mod server;
pub mod transport;

pub use builder::{ResponseBuilder, ResponseSource};
pub use mapping::{ContextResponseMapper, ErrorResponseMapper, PlainTextErrorMapper, ResponseMapper};
pub use response::{HeaderError, ResponseDescriptor, ResponseDescriptorBuilder};
pub use server::{HttpServer, ServerError};
pub use transport::{into_http_response, response_slot, HttpResponseSlot};

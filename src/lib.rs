//! Per-endpoint HTTP response pipeline.
//!
//! Every request runs through the same sequence: admission control, the
//! processing chain, response construction, and hand-off to the transport.
//! The write outcome is reported back asynchronously and feeds the endpoint
//! statistics.

pub mod admin;
pub mod clock;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod processing;
pub mod statistics;
pub mod throttling;

pub use config::PipelineConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::ResponsePipeline;

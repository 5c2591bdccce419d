//! Statistics subsystem.
//!
//! # Data Flow
//! ```text
//! Response pipeline (many concurrent requests):
//!     → inc_received_events        on arrival
//!     → inc_execution/fatal_error  when the processing chain fails
//!     → add_complete_execution_time when an admitted request finishes delivery
//!
//! Readers (admin API, metrics):
//!     → snapshot() at any time, never blocking writers
//! ```
//!
//! # Design Decisions
//! - Counters are lock-free atomics; only enable/clear/rename share a mutex
//! - `clear` may race with increments; statistics are advisory, not accounting
//! - Disabled statistics are filtered by the caller, not inside the aggregator

pub mod execution;
pub mod flow;

pub use execution::ExecutionTimes;
pub use flow::{FlowStatistics, StatisticsSnapshot};

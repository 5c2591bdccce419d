//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! Request received
//!     → admission.rs (consume one call from the current window)
//!     → decision.rs (immutable snapshot: allowed, remaining, limit, reset)
//!     → Pipeline: admitted → processing chain
//!                 refused  → discard response with rate-limit headers
//! ```
//!
//! # Design Decisions
//! - Fixed window, refilled lazily on the first call past the boundary
//! - Lock-free: one atomic counter plus one atomic boundary
//! - Not configured means unlimited, reported with the -1 sentinel

pub mod admission;
pub mod decision;

pub use admission::AdmissionController;
pub use decision::{
    ThrottlingDecision, UNLIMITED, X_RATE_LIMIT_LIMIT, X_RATE_LIMIT_REMAINING, X_RATE_LIMIT_RESET,
};

//! Per-request admission snapshot.

use axum::http::{HeaderName, HeaderValue};

/// `X-RateLimit-Limit`: the quota per period.
pub const X_RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
/// `X-RateLimit-Remaining`: calls left in the current period.
pub const X_RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
/// `X-RateLimit-Reset`: milliseconds until the quota refills.
pub const X_RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Sentinel used for `limit`/`remaining` when throttling is not configured.
pub const UNLIMITED: i64 = -1;

/// Outcome of one admission check. Computed once per request and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlingDecision {
    pub allowed: bool,
    pub remaining: i64,
    pub limit: i64,
    /// Epoch millisecond at which the current period ends.
    pub reset_at_millis: i64,
    /// Time left in the current period when the decision was taken.
    pub reset_in_millis: i64,
}

impl ThrottlingDecision {
    /// Decision returned when no quota is configured.
    pub const fn unlimited() -> Self {
        Self {
            allowed: true,
            remaining: UNLIMITED,
            limit: UNLIMITED,
            reset_at_millis: UNLIMITED,
            reset_in_millis: UNLIMITED,
        }
    }

    /// Whether the rate-limit headers should be attached for this decision.
    pub fn is_limited(&self) -> bool {
        self.limit >= 0
    }

    /// The three rate-limit headers, in emission order.
    pub fn headers(&self) -> [(HeaderName, HeaderValue); 3] {
        [
            (X_RATE_LIMIT_LIMIT, HeaderValue::from(self.limit)),
            (X_RATE_LIMIT_REMAINING, HeaderValue::from(self.remaining)),
            (X_RATE_LIMIT_RESET, HeaderValue::from(self.reset_in_millis)),
        ]
    }
}

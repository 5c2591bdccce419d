//! Fixed-window admission controller.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::config::ThrottlingConfig;
use crate::throttling::decision::ThrottlingDecision;

/// Marks `reset_at_millis` while the winning caller refills the window.
const REFILLING: i64 = i64::MIN;

/// Quota window shared by every request of an endpoint.
#[derive(Debug)]
struct QuotaWindow {
    limit: i64,
    period_ms: i64,
    remaining: AtomicI64,
    reset_at_millis: AtomicI64,
}

/// Decides whether a request may proceed under a quota of `limit` calls per `period`.
///
/// The window is refilled lazily by the first call that observes the clock past
/// `reset_at`; there is no background timer. All state lives in two atomics, so
/// `decide` can be called from any number of tasks without external locking.
///
/// The refill claims the window by swapping `reset_at` for a marker, stores the
/// new `remaining`, then publishes the new `reset_at`. Callers that see the
/// marker spin until it is published, so nobody evaluates the new window
/// against the old counter.
#[derive(Debug)]
pub struct AdmissionController {
    window: Option<QuotaWindow>,
    clock: Arc<dyn Clock>,
}

impl AdmissionController {
    /// Controller that admits everything and reports the unlimited sentinel.
    pub fn unlimited() -> Self {
        Self {
            window: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Controller allowing `limit` calls per `period`, starting a fresh window now.
    pub fn with_quota(limit: i64, period: Duration, clock: Arc<dyn Clock>) -> Self {
        let period_ms = (period.as_millis() as i64).max(1);
        let limit = limit.max(0);
        let now = clock.now_millis();
        Self {
            window: Some(QuotaWindow {
                limit,
                period_ms,
                remaining: AtomicI64::new(limit),
                reset_at_millis: AtomicI64::new(now + period_ms),
            }),
            clock,
        }
    }

    pub fn from_config(config: &ThrottlingConfig, clock: Arc<dyn Clock>) -> Self {
        if !config.enabled {
            return Self::unlimited();
        }
        tracing::info!(
            limit = config.limit,
            period_ms = config.period_ms,
            discard_status = config.discard_status_code,
            "Admission control enabled"
        );
        Self::with_quota(
            config.limit,
            Duration::from_millis(config.period_ms.max(1) as u64),
            clock,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.window.is_some()
    }

    /// Consume one call from the current window if any is left.
    pub fn decide(&self) -> ThrottlingDecision {
        let Some(window) = &self.window else {
            return ThrottlingDecision::unlimited();
        };
        let now = self.clock.now_millis();

        loop {
            let reset_at = window.reset_at_millis.load(Ordering::Acquire);

            if reset_at == REFILLING {
                std::hint::spin_loop();
                continue;
            }

            if now > reset_at {
                if window
                    .reset_at_millis
                    .compare_exchange(reset_at, REFILLING, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    let next_reset = now + window.period_ms;
                    window.remaining.store(window.limit, Ordering::Relaxed);
                    window.reset_at_millis.store(next_reset, Ordering::Release);
                    tracing::trace!(limit = window.limit, reset_at = next_reset, "Quota window refilled");
                }
                // Either we refilled or someone else is; evaluate against the new window.
                continue;
            }

            let reset_in_millis = (reset_at - now).max(0);

            let taken = window
                .remaining
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |r| {
                    (r > 0).then(|| r - 1)
                });

            return match taken {
                Ok(previous) => ThrottlingDecision {
                    allowed: true,
                    remaining: previous - 1,
                    limit: window.limit,
                    reset_at_millis: reset_at,
                    reset_in_millis,
                },
                Err(_) => ThrottlingDecision {
                    allowed: false,
                    remaining: 0,
                    limit: window.limit,
                    reset_at_millis: reset_at,
                    reset_in_millis,
                },
            };
        }
    }
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::unlimited()
    }
}

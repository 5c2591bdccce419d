//! Per-endpoint statistics aggregator.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::statistics::execution::ExecutionTimes;

/// Counters and timers for one logical endpoint.
///
/// Counter updates are plain atomic increments and never take a lock. Only
/// `set_enabled`, `clear` and renaming go through `control`, so they cannot
/// interleave with each other; they can still race with increments, in which
/// case an increment landing during `clear` may or may not survive it.
#[derive(Debug)]
pub struct FlowStatistics {
    kind: String,
    name: RwLock<String>,
    enabled: AtomicBool,
    control: Mutex<()>,
    sample_start_millis: AtomicI64,
    received_events: AtomicU64,
    execution_errors: AtomicU64,
    fatal_errors: AtomicU64,
    execution: ExecutionTimes,
    clock: Arc<dyn Clock>,
}

impl FlowStatistics {
    /// Create a disabled aggregator whose sample period starts now.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_clock(kind, name, Arc::new(SystemClock))
    }

    pub fn with_clock(kind: impl Into<String>, name: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        let stats = Self {
            kind: kind.into(),
            name: RwLock::new(name.into()),
            enabled: AtomicBool::new(false),
            control: Mutex::new(()),
            sample_start_millis: AtomicI64::new(0),
            received_events: AtomicU64::new(0),
            execution_errors: AtomicU64::new(0),
            fatal_errors: AtomicU64::new(0),
            execution: ExecutionTimes::new(),
            clock,
        };
        stats.clear();
        stats
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> String {
        self.name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        let _guard = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        *self.name.write().unwrap_or_else(PoisonError::into_inner) = name.into();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Toggle recording. Callers are expected to check `is_enabled` before
    /// recording; the aggregator itself does not filter.
    pub fn set_enabled(&self, enabled: bool) {
        let _guard = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        self.enabled.store(enabled, Ordering::Relaxed);
        tracing::debug!(statistics = %self.name(), enabled, "Statistics toggled");
    }

    /// Zero every counter and restart the sample period.
    pub fn clear(&self) {
        let _guard = self.control.lock().unwrap_or_else(PoisonError::into_inner);
        self.received_events.store(0, Ordering::Relaxed);
        self.execution_errors.store(0, Ordering::Relaxed);
        self.fatal_errors.store(0, Ordering::Relaxed);
        self.execution.clear();
        self.sample_start_millis
            .store(self.clock.now_millis(), Ordering::Relaxed);
    }

    pub fn inc_received_events(&self) {
        self.received_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_execution_error(&self) {
        self.execution_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fatal_error(&self) {
        self.fatal_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_complete_execution_time(&self, millis: u64) {
        self.execution.add_complete(millis);
    }

    pub fn add_execution_branch_time(&self, branch_millis: u64, total_millis: u64) {
        self.execution.add_branch(branch_millis, total_millis);
    }

    pub fn total_events_received(&self) -> u64 {
        self.received_events.load(Ordering::Relaxed)
    }

    pub fn execution_errors(&self) -> u64 {
        self.execution_errors.load(Ordering::Relaxed)
    }

    pub fn fatal_errors(&self) -> u64 {
        self.fatal_errors.load(Ordering::Relaxed)
    }

    pub fn processed_events(&self) -> u64 {
        self.execution.executed()
    }

    pub fn average_processing_time(&self) -> u64 {
        self.execution.average()
    }

    pub fn min_processing_time(&self) -> u64 {
        self.execution.min()
    }

    pub fn max_processing_time(&self) -> u64 {
        self.execution.max()
    }

    pub fn total_processing_time(&self) -> u64 {
        self.execution.total()
    }

    /// Milliseconds elapsed since the last `clear`.
    pub fn sample_period(&self) -> i64 {
        self.clock.now_millis() - self.sample_start_millis.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of the whole read surface.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            name: self.name(),
            kind: self.kind.clone(),
            enabled: self.is_enabled(),
            received_events: self.total_events_received(),
            execution_errors: self.execution_errors(),
            fatal_errors: self.fatal_errors(),
            average_processing_time: self.average_processing_time(),
            min_processing_time: self.min_processing_time(),
            max_processing_time: self.max_processing_time(),
            total_processing_time: self.total_processing_time(),
            processed_events: self.processed_events(),
            sample_period: self.sample_period(),
        }
    }
}

/// Serializable view of [`FlowStatistics`]. Times are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub name: String,
    pub kind: String,
    pub enabled: bool,
    pub received_events: u64,
    pub execution_errors: u64,
    pub fatal_errors: u64,
    pub average_processing_time: u64,
    pub min_processing_time: u64,
    pub max_processing_time: u64,
    pub total_processing_time: u64,
    pub processed_events: u64,
    pub sample_period: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::thread;

    fn stats_at(start: i64) -> (FlowStatistics, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start));
        let stats = FlowStatistics::with_clock("http-listener", "orders", clock.clone());
        (stats, clock)
    }

    #[test]
    fn starts_disabled_and_empty() {
        let (stats, _) = stats_at(1_000);
        assert!(!stats.is_enabled());
        assert_eq!(stats.total_events_received(), 0);
        assert_eq!(stats.average_processing_time(), 0);
        assert_eq!(stats.sample_period(), 0);
    }

    #[test]
    fn counters_are_independent() {
        let (stats, _) = stats_at(0);
        stats.inc_received_events();
        stats.inc_received_events();
        stats.inc_execution_error();
        stats.inc_fatal_error();
        stats.inc_fatal_error();
        assert_eq!(stats.total_events_received(), 2);
        assert_eq!(stats.execution_errors(), 1);
        assert_eq!(stats.fatal_errors(), 2);
    }

    #[test]
    fn concurrent_samples_aggregate_exactly() {
        let (stats, _) = stats_at(0);
        let stats = Arc::new(stats);
        let handles: Vec<_> = (1..=8u64)
            .map(|worker| {
                let stats = stats.clone();
                thread::spawn(move || {
                    for i in 0..100u64 {
                        stats.inc_received_events();
                        stats.add_complete_execution_time(worker * 10 + i % 2);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        // Each worker adds 50 samples of w*10 and 50 of w*10+1.
        let expected_total: u64 = (1..=8u64).map(|w| 100 * w * 10 + 50).sum();
        assert_eq!(stats.processed_events(), 800);
        assert_eq!(stats.total_events_received(), 800);
        assert_eq!(stats.total_processing_time(), expected_total);
        assert_eq!(stats.average_processing_time(), expected_total / 800);
        assert_eq!(stats.min_processing_time(), 10);
        assert_eq!(stats.max_processing_time(), 81);
    }

    #[test]
    fn clear_resets_counters_and_sample_period() {
        let (stats, clock) = stats_at(10_000);
        stats.inc_received_events();
        stats.inc_execution_error();
        stats.inc_fatal_error();
        stats.add_complete_execution_time(12);
        clock.advance(5_000);
        assert_eq!(stats.sample_period(), 5_000);

        stats.clear();
        let snap = stats.snapshot();
        assert_eq!(snap.received_events, 0);
        assert_eq!(snap.execution_errors, 0);
        assert_eq!(snap.fatal_errors, 0);
        assert_eq!(snap.processed_events, 0);
        assert_eq!(snap.sample_period, 0);
    }

    #[test]
    fn clear_racing_increments_keeps_counting() {
        let stats = Arc::new(FlowStatistics::new("http-listener", "race"));
        let writer = {
            let stats = stats.clone();
            thread::spawn(move || {
                for _ in 0..10_000 {
                    stats.inc_received_events();
                }
            })
        };
        for _ in 0..10 {
            stats.clear();
        }
        writer.join().unwrap();
        let after_race = stats.total_events_received();
        assert!(after_race <= 10_000);

        stats.clear();
        stats.inc_received_events();
        assert_eq!(stats.total_events_received(), 1);
    }

    #[test]
    fn enable_and_rename() {
        let (stats, _) = stats_at(0);
        stats.set_enabled(true);
        stats.set_name("payments");
        let snap = stats.snapshot();
        assert!(snap.enabled);
        assert_eq!(snap.name, "payments");
        assert_eq!(snap.kind, "http-listener");
    }
}

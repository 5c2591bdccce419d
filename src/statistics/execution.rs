//! Running execution-time aggregate.

use std::sync::atomic::{AtomicU64, Ordering};

/// Sentinel meaning "no sample recorded yet" for the minimum.
const NO_MIN: u64 = u64::MAX;

/// Lock-free {count, total, min, max} aggregate of execution times in milliseconds.
///
/// Each field is updated independently, so a reader racing with a writer may
/// observe a sample counted in `executed` but not yet in `total`. That skew is
/// bounded by the number of in-flight writers and disappears once they finish.
#[derive(Debug)]
pub struct ExecutionTimes {
    executed: AtomicU64,
    total: AtomicU64,
    min: AtomicU64,
    max: AtomicU64,
}

impl ExecutionTimes {
    pub fn new() -> Self {
        Self {
            executed: AtomicU64::new(0),
            total: AtomicU64::new(0),
            min: AtomicU64::new(NO_MIN),
            max: AtomicU64::new(0),
        }
    }

    /// Record one complete execution.
    pub fn add_complete(&self, millis: u64) {
        self.executed.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(millis, Ordering::Relaxed);
        self.min.fetch_min(millis, Ordering::Relaxed);
        self.max.fetch_max(millis, Ordering::Relaxed);
    }

    /// Record one branch of a multi-branch execution.
    ///
    /// `branch` is added to the running total. The branch whose time equals the
    /// whole execution time (the first one to finish the flow) counts the
    /// execution and feeds min/max with `total`.
    pub fn add_branch(&self, branch: u64, total: u64) {
        self.total.fetch_add(branch, Ordering::Relaxed);
        if branch == total {
            self.executed.fetch_add(1, Ordering::Relaxed);
            self.min.fetch_min(total, Ordering::Relaxed);
            self.max.fetch_max(total, Ordering::Relaxed);
        }
    }

    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    /// Smallest recorded time, 0 when nothing was recorded.
    pub fn min(&self) -> u64 {
        match self.min.load(Ordering::Relaxed) {
            NO_MIN => 0,
            v => v,
        }
    }

    pub fn max(&self) -> u64 {
        self.max.load(Ordering::Relaxed)
    }

    /// `total / executed`, 0 when nothing was recorded.
    pub fn average(&self) -> u64 {
        let executed = self.executed();
        if executed == 0 {
            0
        } else {
            self.total() / executed
        }
    }

    pub fn clear(&self) {
        self.executed.store(0, Ordering::Relaxed);
        self.total.store(0, Ordering::Relaxed);
        self.min.store(NO_MIN, Ordering::Relaxed);
        self.max.store(0, Ordering::Relaxed);
    }
}

impl Default for ExecutionTimes {
    fn default() -> Self {
        Self::new()
    }
}

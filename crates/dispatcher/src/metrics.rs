//! Dispatch metrics for observability

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a single dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Every trigger delivered, winning or not
    triggers_received: AtomicU64,
    /// Triggers that lost the race to the winning trigger
    triggers_absorbed: AtomicU64,
    /// Triggers delivered before arming or after teardown
    triggers_ignored: AtomicU64,
    /// Entries whose effect completed
    entries_run: AtomicU64,
    /// Entries whose predicate was false
    entries_skipped: AtomicU64,
    /// Entries whose predicate or effect errored or panicked
    entries_failed: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triggers_received(&self) -> u64 {
        self.triggers_received.load(Ordering::Relaxed)
    }

    pub fn inc_triggers_received(&self) {
        self.triggers_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn triggers_absorbed(&self) -> u64 {
        self.triggers_absorbed.load(Ordering::Relaxed)
    }

    pub fn inc_triggers_absorbed(&self) {
        self.triggers_absorbed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn triggers_ignored(&self) -> u64 {
        self.triggers_ignored.load(Ordering::Relaxed)
    }

    pub fn inc_triggers_ignored(&self) {
        self.triggers_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn entries_run(&self) -> u64 {
        self.entries_run.load(Ordering::Relaxed)
    }

    pub fn inc_entries_run(&self) {
        self.entries_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn entries_skipped(&self) -> u64 {
        self.entries_skipped.load(Ordering::Relaxed)
    }

    pub fn inc_entries_skipped(&self) {
        self.entries_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn entries_failed(&self) -> u64 {
        self.entries_failed.load(Ordering::Relaxed)
    }

    pub fn inc_entries_failed(&self) {
        self.entries_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            triggers_received: self.triggers_received(),
            triggers_absorbed: self.triggers_absorbed(),
            triggers_ignored: self.triggers_ignored(),
            entries_run: self.entries_run(),
            entries_skipped: self.entries_skipped(),
            entries_failed: self.entries_failed(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSnapshot {
    pub triggers_received: u64,
    pub triggers_absorbed: u64,
    pub triggers_ignored: u64,
    pub entries_run: u64,
    pub entries_skipped: u64,
    pub entries_failed: u64,
}

//! Outcome of the single dispatch pass

use contracts::TriggerSource;
use serde::Serialize;

/// Entry whose predicate or effect faulted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEntry {
    pub name: String,
    pub message: String,
}

/// What the winning trigger did with the roster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchReport {
    /// Trigger that won the race
    pub source: TriggerSource,
    /// Entries whose effect ran, in roster order
    pub ran: Vec<String>,
    /// Entries gated off by their predicate
    pub skipped: Vec<String>,
    pub failed: Vec<FailedEntry>,
    /// Wall time spent iterating the roster
    pub duration_ms: f64,
}

impl DispatchReport {
    pub(crate) fn new(source: TriggerSource) -> Self {
        Self {
            source,
            ran: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            duration_ms: 0.0,
        }
    }

    /// Total entries visited
    pub fn visited(&self) -> usize {
        self.ran.len() + self.skipped.len() + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

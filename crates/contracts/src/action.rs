//! ActionEntry - one gated roster integration
//!
//! The dispatcher only ever sees `(name, predicate, effect)`; vendor identity
//! and payloads stay inside the closures.

use std::fmt;

use crate::ContractError;

type Predicate = Box<dyn Fn() -> bool + Send + Sync + 'static>;
type Effect = Box<dyn Fn() -> Result<(), ContractError> + Send + Sync + 'static>;

/// A single gated integration in the roster
pub struct ActionEntry {
    name: String,
    predicate: Predicate,
    effect: Effect,
}

impl ActionEntry {
    /// Create an entry from a predicate and an effect
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn() -> bool + Send + Sync + 'static,
        effect: impl Fn() -> Result<(), ContractError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
            effect: Box::new(effect),
        }
    }

    /// Create an entry that is enabled or disabled once, at construction
    pub fn gated(
        name: impl Into<String>,
        enabled: bool,
        effect: impl Fn() -> Result<(), ContractError> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, move || enabled, effect)
    }

    /// Diagnostic name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the enabled/configured predicate
    pub fn is_enabled(&self) -> bool {
        (self.predicate)()
    }

    /// Initiate the effect
    pub fn run(&self) -> Result<(), ContractError> {
        (self.effect)()
    }
}

impl fmt::Debug for ActionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered list of gated integrations
#[derive(Debug, Default)]
pub struct Roster {
    entries: Vec<ActionEntry>,
}

impl Roster {
    /// Create an empty roster
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the end of the declared order
    pub fn push(&mut self, entry: ActionEntry) {
        self.entries.push(entry);
    }

    /// Builder-style append
    pub fn with(mut self, entry: ActionEntry) -> Self {
        self.push(entry);
        self
    }

    /// Entries in declared order
    pub fn entries(&self) -> &[ActionEntry] {
        &self.entries
    }

    /// Entry names in declared order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(ActionEntry::name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ActionEntry> for Roster {
    fn from_iter<I: IntoIterator<Item = ActionEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<ActionEntry> for Roster {
    fn extend<I: IntoIterator<Item = ActionEntry>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_entry_runs_effect() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let entry = ActionEntry::gated("counter", true, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(entry.is_enabled());
        entry.run().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_roster_preserves_order() {
        let roster: Roster = ["a", "b", "c"]
            .into_iter()
            .map(|name| ActionEntry::gated(name, true, || Ok(())))
            .collect();
        assert_eq!(roster.names(), vec!["a", "b", "c"]);
        assert_eq!(roster.len(), 3);
    }
}

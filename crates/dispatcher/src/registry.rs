//! Trigger registry - listeners and the fallback timer owned by one dispatcher

use contracts::{ListenerId, TimerId, TriggerKind};

/// One interaction listener registered with the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRegistration {
    pub kind: TriggerKind,
    pub listener: ListenerId,
}

/// Everything that must be released when the dispatcher disarms
#[derive(Debug, Default)]
pub struct Registry {
    listeners: Vec<TriggerRegistration>,
    timer: Option<TimerId>,
}

/// Handles taken out of the registry, to be released outside its lock
#[derive(Debug, Default)]
pub struct Released {
    pub listeners: Vec<TriggerRegistration>,
    pub timer: Option<TimerId>,
}

impl Registry {
    pub fn register(&mut self, kind: TriggerKind, listener: ListenerId) {
        self.listeners.push(TriggerRegistration { kind, listener });
    }

    /// Record the fallback timer, returning any timer it replaces
    pub fn set_timer(&mut self, timer: TimerId) -> Option<TimerId> {
        self.timer.replace(timer)
    }

    pub fn listeners(&self) -> &[TriggerRegistration] {
        &self.listeners
    }

    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// Empty the registry
    pub fn drain(&mut self) -> Released {
        Released {
            listeners: std::mem::take(&mut self.listeners),
            timer: self.timer.take(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_registry() {
        let mut registry = Registry::default();
        registry.register(TriggerKind::Scroll, ListenerId(1));
        registry.register(TriggerKind::Click, ListenerId(2));
        assert_eq!(registry.set_timer(TimerId(7)), None);

        let released = registry.drain();
        assert_eq!(released.listeners.len(), 2);
        assert_eq!(released.timer, Some(TimerId(7)));
        assert!(registry.listeners().is_empty());
        assert!(!registry.has_timer());
    }
}

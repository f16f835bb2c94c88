//! Dispatch state - a single atomic phase word

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle phase of a dispatcher
///
/// Only ever moves forward: `Unstarted -> Pending -> Armed -> Firing -> Fired`,
/// with `TornDown` reachable from any phase before `Firing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Phase {
    /// Constructed, nothing registered
    Unstarted = 0,
    /// Installed, waiting for the document to be ready
    Pending = 1,
    /// Listeners and fallback registered
    Armed = 2,
    /// A trigger won the race; roster is running
    Firing = 3,
    /// Roster ran to completion
    Fired = 4,
    /// Disarmed without dispatch
    TornDown = 5,
}

impl Phase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Unstarted,
            1 => Self::Pending,
            2 => Self::Armed,
            3 => Self::Firing,
            4 => Self::Fired,
            _ => Self::TornDown,
        }
    }

    /// The `fired` flag: true once a trigger has won
    pub fn is_fired(self) -> bool {
        matches!(self, Self::Firing | Self::Fired)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Fired | Self::TornDown)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unstarted => "unstarted",
            Self::Pending => "pending",
            Self::Armed => "armed",
            Self::Firing => "firing",
            Self::Fired => "fired",
            Self::TornDown => "torn down",
        })
    }
}

/// Atomic holder for [`Phase`]
#[derive(Debug)]
pub struct DispatchState {
    phase: AtomicU8,
}

impl DispatchState {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(Phase::Unstarted as u8),
        }
    }

    pub fn load(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Compare-and-swap `from -> to`
    ///
    /// Returns the observed phase on failure.
    pub fn transition(&self, from: Phase, to: Phase) -> Result<(), Phase> {
        self.phase
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(Phase::from_u8)
    }

    /// Move to `to` from whichever of `from` currently holds
    pub fn transition_from_any(&self, from: &[Phase], to: Phase) -> Result<Phase, Phase> {
        let mut current = self.load();
        loop {
            if !from.contains(&current) {
                return Err(current);
            }
            match self.transition(current, to) {
                Ok(()) => return Ok(current),
                Err(observed) => current = observed,
            }
        }
    }

    /// Unconditional store, used for `Firing -> Fired` by the winning trigger
    pub(crate) fn store(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::Release);
    }
}

impl Default for DispatchState {
    fn default() -> Self {
        Self::new()
    }
}

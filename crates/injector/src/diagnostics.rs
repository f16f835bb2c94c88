//! Diagnostics - debug-gated log and unconditional warn

use std::fmt::Display;
use tracing::{info, warn};

/// Diagnostic sink shared by injector, dispatcher and roster
///
/// `log` only emits when the loader runs in debug mode; `warn` always emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    debug: bool,
}

impl Diagnostics {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Debug-gated informational message
    pub fn log(&self, message: impl Display) {
        if self.debug {
            info!(target: "snippet_loader", "{message}");
        }
    }

    /// Warning, emitted regardless of debug mode
    pub fn warn(&self, message: impl Display) {
        warn!(target: "snippet_loader", "{message}");
    }
}

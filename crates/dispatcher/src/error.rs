//! Dispatcher error types

use thiserror::Error;

use crate::state::Phase;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Rejected dispatcher configuration
    #[error("invalid dispatcher config '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    /// Lifecycle call made in the wrong phase
    #[error("cannot {operation} while {phase}")]
    InvalidState {
        operation: &'static str,
        phase: Phase,
    },
}

impl DispatcherError {
    /// Create an invalid config error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}

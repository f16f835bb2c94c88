//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// `--interact` value could not be parsed
    #[error("Invalid interaction '{input}': {message}")]
    InvalidInteraction { input: String, message: String },

    /// Simulation could not be set up
    #[error("Simulation failed: {message}")]
    Simulation { message: String },

    /// Generic error wrapper
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn invalid_interaction(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInteraction {
            input: input.into(),
            message: message.into(),
        }
    }

    pub fn simulation(message: impl Into<String>) -> Self {
        Self::Simulation {
            message: message.into(),
        }
    }
}

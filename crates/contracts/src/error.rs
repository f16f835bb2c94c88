//! Layered error definitions
//!
//! Categorized by source: config / descriptor / host / effect

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Injection Errors =====
    /// Script or noscript descriptor rejected before touching the host
    #[error("invalid descriptor field '{field}': {message}")]
    InvalidDescriptor { field: String, message: String },

    // ===== Host Errors =====
    /// Host refused an operation
    #[error("host error: {message}")]
    Host { message: String },

    /// Element handle does not belong to the host
    #[error("unknown element: {0}")]
    UnknownElement(crate::ElementId),

    // ===== Roster Errors =====
    /// A roster entry failed while initiating its effect
    #[error("effect '{entry}' failed: {message}")]
    Effect { entry: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create descriptor error
    pub fn invalid_descriptor(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDescriptor {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create host error
    pub fn host(message: impl Into<String>) -> Self {
        Self::Host {
            message: message.into(),
        }
    }

    /// Create effect error
    pub fn effect(entry: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Effect {
            entry: entry.into(),
            message: message.into(),
        }
    }
}

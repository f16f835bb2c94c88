//! Script descriptors - Injector input
//!
//! Describes a `<script>` tag to create and where to attach it.

use std::fmt;

use crate::{Callback, ContractError, Placement};

/// Script tag to inject
pub struct ScriptDescriptor {
    /// Source URL, required and non-empty
    pub src: String,
    /// Load asynchronously (default true)
    pub async_load: bool,
    /// Defer execution (default false)
    pub defer: bool,
    /// Attachment point (default body)
    pub target: Placement,
    /// Extra attributes, applied in order
    pub attributes: Vec<(String, String)>,
    /// Success callback
    pub on_load: Option<Callback>,
    /// Failure callback, invoked after the injector's own warning
    pub on_error: Option<Callback>,
}

impl ScriptDescriptor {
    /// Create a descriptor with default load mode and placement
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            async_load: true,
            defer: false,
            target: Placement::Body,
            attributes: Vec::new(),
            on_load: None,
            on_error: None,
        }
    }

    /// Set the async flag
    pub fn async_load(mut self, async_load: bool) -> Self {
        self.async_load = async_load;
        self
    }

    /// Set the defer flag
    pub fn defer(mut self, defer: bool) -> Self {
        self.defer = defer;
        self
    }

    /// Set the attachment point
    pub fn target(mut self, target: Placement) -> Self {
        self.target = target;
        self
    }

    /// Add an extra attribute
    pub fn attribute(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push((name.into(), value.to_string()));
        self
    }

    /// Register the success callback
    pub fn on_load(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_load = Some(Box::new(callback));
        self
    }

    /// Register the failure callback
    pub fn on_error(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Check required fields
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.src.trim().is_empty() {
            return Err(ContractError::invalid_descriptor(
                "src",
                "script source cannot be empty",
            ));
        }
        if let Some((name, _)) = self.attributes.iter().find(|(name, _)| name.trim().is_empty()) {
            return Err(ContractError::invalid_descriptor(
                format!("attributes[{name:?}]"),
                "attribute name cannot be empty",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ScriptDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptDescriptor")
            .field("src", &self.src)
            .field("async_load", &self.async_load)
            .field("defer", &self.defer)
            .field("target", &self.target)
            .field("attributes", &self.attributes)
            .field("on_load", &self.on_load.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let desc = ScriptDescriptor::new("https://cdn.example.com/a.js");
        assert!(desc.async_load);
        assert!(!desc.defer);
        assert_eq!(desc.target, Placement::Body);
        assert!(desc.attributes.is_empty());
        assert!(desc.validate().is_ok());
    }

    #[test]
    fn test_empty_src_rejected() {
        let err = ScriptDescriptor::new("  ").validate().unwrap_err();
        assert!(matches!(err, ContractError::InvalidDescriptor { .. }));
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_empty_attribute_name_rejected() {
        let desc = ScriptDescriptor::new("/a.js").attribute("", "x");
        assert!(desc.validate().is_err());
    }

    #[test]
    fn test_builder_chain() {
        let desc = ScriptDescriptor::new("/a.js")
            .defer(true)
            .async_load(false)
            .target(Placement::Footer)
            .attribute("data-position", 5)
            .on_load(|| {});
        assert!(desc.defer);
        assert!(!desc.async_load);
        assert_eq!(desc.target, Placement::Footer);
        assert_eq!(desc.attributes, vec![("data-position".into(), "5".into())]);
        assert!(desc.on_load.is_some());
        assert!(desc.on_error.is_none());
    }
}

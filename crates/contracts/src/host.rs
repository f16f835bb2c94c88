//! HostEnvironment trait - the page runtime seen by the loader
//!
//! Abstracts the document/window globals so the core runs against a real
//! browser binding or an in-memory page alike.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::{ContractError, TriggerKind};

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

define_handle!(
    /// Opaque handle to an element owned by the host document
    ElementId,
    "element"
);
define_handle!(
    /// Opaque handle to a registered event listener
    ListenerId,
    "listener"
);
define_handle!(
    /// Opaque handle to a scheduled one-shot timer
    TimerId,
    "timer"
);

/// One-shot callback (timers, idle callbacks, load events, readiness)
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Re-invocable event listener
pub type Listener = Arc<dyn Fn(TriggerKind) + Send + Sync + 'static>;

/// Shared host reference handed to injector, dispatcher and roster
pub type SharedHost = Arc<dyn HostEnvironment>;

/// Load and error handlers attached to a script element
#[derive(Default)]
pub struct LoadHandlers {
    /// Called when the resource finished loading
    pub on_load: Option<Callback>,
    /// Called when the resource failed to load
    pub on_error: Option<Callback>,
}

impl fmt::Debug for LoadHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadHandlers")
            .field("on_load", &self.on_load.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Well-known container nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Head,
    #[default]
    Body,
    Footer,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Head => "head",
            Self::Body => "body",
            Self::Footer => "footer",
        })
    }
}

/// Capabilities the loader needs from its page runtime
///
/// Implementations use interior mutability; every method takes `&self` so a
/// single host can be shared between the dispatcher, the injector and every
/// roster entry.
pub trait HostEnvironment: Send + Sync {
    // ===== Elements =====

    /// Create a detached element with the given tag name
    fn create_element(&self, tag: &str) -> ElementId;

    /// Set an attribute; an empty value renders as a boolean attribute
    fn set_attribute(&self, element: ElementId, name: &str, value: &str)
        -> Result<(), ContractError>;

    /// Replace the literal inner markup of an element
    fn set_inner_html(&self, element: ElementId, markup: &str) -> Result<(), ContractError>;

    /// Attach load/error handlers; at most one of them is ever invoked
    fn set_load_handlers(
        &self,
        element: ElementId,
        handlers: LoadHandlers,
    ) -> Result<(), ContractError>;

    /// Append `child` as the last child of `parent`
    fn append_child(&self, parent: ElementId, child: ElementId) -> Result<(), ContractError>;

    /// Insert `child` as the first child of `parent`
    fn prepend_child(&self, parent: ElementId, child: ElementId) -> Result<(), ContractError>;

    // ===== Containers =====

    /// Look up a well-known container, `None` when the document lacks it
    fn container(&self, placement: Placement) -> Option<ElementId>;

    /// The document body, always present
    fn body(&self) -> ElementId;

    // ===== Listeners =====

    /// Register a listener for an interaction event
    fn add_listener(&self, kind: TriggerKind, listener: Listener) -> ListenerId;

    /// Remove a listener; unknown ids are ignored
    fn remove_listener(&self, id: ListenerId);

    // ===== Timers =====

    /// Schedule a one-shot callback after `delay`
    fn set_timeout(&self, delay: Duration, callback: Callback) -> TimerId;

    /// Cancel a pending timer; unknown or elapsed ids are ignored
    fn clear_timeout(&self, id: TimerId);

    // ===== Idle scheduling =====

    /// Whether low-priority idle scheduling is available
    fn supports_idle(&self) -> bool {
        false
    }

    /// Run `callback` once the runtime is idle, or after `timeout` at the latest
    ///
    /// Hosts without idle support fall back to a zero-delay timer.
    fn request_idle(&self, timeout: Duration, callback: Callback) {
        let _ = timeout;
        self.set_timeout(Duration::ZERO, callback);
    }

    // ===== Readiness =====

    /// Run `callback` once the document finished parsing
    ///
    /// Hosts whose document is always ready may schedule it immediately.
    fn when_ready(&self, callback: Callback) {
        self.set_timeout(Duration::ZERO, callback);
    }

    // ===== Globals =====

    /// Read a window-level global
    fn global(&self, name: &str) -> Option<serde_json::Value>;

    /// Define or overwrite a window-level global
    fn set_global(&self, name: &str, value: serde_json::Value);

    /// Mutate a global in place; a missing global starts as `Null`
    fn update_global(&self, name: &str, update: &mut dyn FnMut(&mut serde_json::Value));
}

//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Host Model
//! - The page runtime is reached exclusively through [`HostEnvironment`]
//! - Element, listener and timer handles are opaque copyable ids
//! - Callbacks handed to the host must never be invoked synchronously from
//!   inside the registration call that received them

mod action;
mod config;
mod error;
mod host;
mod script;
mod trigger;

pub use action::*;
pub use config::*;
pub use error::*;
pub use host::*;
pub use script::*;
pub use trigger::*;

//! # Injector
//!
//! Script injection utility.
//!
//! Responsibilities:
//! - Create `<script>` tags with source, load mode, extra attributes
//! - Attach load / error callbacks (error always warns first)
//! - Resolve head / body / footer containers with a body fallback
//! - Create `<noscript>` fallbacks with literal markup
//! - Seed window globals the vendor snippets expect
//!
//! Has no dependency on the dispatcher.

mod diagnostics;
pub mod globals;
mod script;

pub use diagnostics::Diagnostics;
pub use script::Injector;

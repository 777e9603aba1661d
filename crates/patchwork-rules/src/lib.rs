//! Patchwork Rules
//!
//! Built-in analyzers, code fixes and refactorings for the patchwork engine.
//! Every rule is a module of [`builtin`] exposing its ids, descriptor,
//! analyzer and fix provider; [`builtin::registry`] registers them all once.

pub mod builtin;

// Re-export commonly used items
pub use builtin::{builtin_rules, registry};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Graft Core
//!
//! Runtime patching of a host's object model:
//! - Member access over host objects (fields, properties, methods)
//! - Deferred item construction with lazily attached sub-components
//! - Tracked, reversible registry patching
//! - Patch activation lifecycle

pub mod access;
pub mod entity;
pub mod error;
pub mod patch;
pub mod registry;

pub use error::ErrorKind;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Graft Services Layer
//!
//! Configuration for the patch runtime.

pub mod settings;

pub use settings::{Settings, SettingsError};

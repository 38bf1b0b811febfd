use crate::access::{AccessError, ObjectRef};
use crate::ErrorKind;
use thiserror::Error;

/// Configuration rejected while an item is being assembled.
///
/// These never end the builder chain; they are logged and collected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("{operation} ignored: {reason}")]
    Validation {
        operation: &'static str,
        reason: String,
    },

    #[error("tag '{name}' is not registered")]
    UnknownTag { name: String },

    #[error("empty tag name")]
    EmptyTagName,

    #[error(transparent)]
    Access(#[from] AccessError),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::Validation { .. }
            | ConfigError::UnknownTag { .. }
            | ConfigError::EmptyTagName => ErrorKind::Validation,
            ConfigError::Access(err) => err.kind(),
        }
    }
}

/// Errors that stop an item from being finalized.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum FinalizeError {
    #[error("{component} belongs to {found}, expected {expected}")]
    ForeignBackReference {
        component: &'static str,
        expected: ObjectRef,
        found: ObjectRef,
    },

    #[error("stack count {count} outside 1..={max}")]
    StackCountOutOfRange { count: i64, max: i32 },

    #[error("durability {durability} outside 0..={max}")]
    DurabilityOutOfRange { durability: f32, max: f32 },

    #[error("modifier targets unknown stat '{stat}'")]
    UnknownStat { stat: String },
}

impl FinalizeError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Finalize
    }
}

use crate::access::ValueKind;
use crate::ErrorKind;
use std::fmt;
use thiserror::Error;

/// Which flavour of member a lookup was after.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Property,
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Field => f.write_str("field"),
            MemberKind::Property => f.write_str("property"),
            MemberKind::Method => f.write_str("method"),
        }
    }
}

/// Direction of a property access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessMode {
    Read,
    Write,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Read => f.write_str("readable"),
            AccessMode::Write => f.write_str("writable"),
        }
    }
}

/// Errors reported by the member access layer.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum AccessError {
    #[error("{operation}: target object for '{member}' is null")]
    NullTarget {
        operation: &'static str,
        member: String,
    },

    #[error("no {member_kind} named '{member}' on '{host_type}' or its base types")]
    MemberNotFound {
        host_type: &'static str,
        member: String,
        member_kind: MemberKind,
    },

    #[error("{candidates} overloads of method '{member}' on '{host_type}' match the arguments")]
    AmbiguousMethod {
        host_type: &'static str,
        member: String,
        candidates: usize,
    },

    #[error("cannot convert '{member}' from {from} to {to}")]
    TypeCoercion {
        member: String,
        from: ValueKind,
        to: ValueKind,
    },

    #[error("property '{member}' on '{host_type}' is not {mode}")]
    AccessDenied {
        host_type: &'static str,
        member: String,
        mode: AccessMode,
    },

    #[error("method '{member}' on '{host_type}' failed: {reason}")]
    Invocation {
        host_type: &'static str,
        member: String,
        reason: String,
    },

    #[error("descriptor for '{member}' does not match the layout of '{host_type}'")]
    TargetMismatch {
        host_type: &'static str,
        member: String,
    },
}

impl AccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::NullTarget { .. } => ErrorKind::NullTarget,
            AccessError::MemberNotFound { .. } | AccessError::AmbiguousMethod { .. } => {
                ErrorKind::MemberNotFound
            }
            AccessError::TypeCoercion { .. } => ErrorKind::TypeCoercion,
            AccessError::AccessDenied { .. } => ErrorKind::AccessDenied,
            AccessError::Invocation { .. } => ErrorKind::Invocation,
            AccessError::TargetMismatch { .. } => ErrorKind::TargetMismatch,
        }
    }
}

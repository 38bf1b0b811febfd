//! Failure classification shared by every subsystem.

use std::fmt;

/// Coarse failure category carried by every error type in this crate.
///
/// Tests and callers match on the kind rather than on individual variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NullTarget,
    MemberNotFound,
    TypeCoercion,
    AccessDenied,
    Invocation,
    TargetMismatch,
    DuplicateKey,
    Validation,
    Finalize,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NullTarget => "null target",
            ErrorKind::MemberNotFound => "member not found",
            ErrorKind::TypeCoercion => "type coercion",
            ErrorKind::AccessDenied => "access denied",
            ErrorKind::Invocation => "invocation",
            ErrorKind::TargetMismatch => "target mismatch",
            ErrorKind::DuplicateKey => "duplicate key",
            ErrorKind::Validation => "validation",
            ErrorKind::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

//! Name-based access to the internals of host objects.
//!
//! Host types describe their members once through `HostType::builder`; the
//! `MemberAccessor` then reads, writes and invokes those members by name,
//! walking base types, coercing scalar values and reporting every failure
//! as an `Outcome` instead of aborting the caller.

mod access_error;
mod accessor;
mod coerce;
mod host_type;
mod macros;
mod value;

pub use access_error::{AccessError, AccessMode, MemberKind};
pub use accessor::{MemberAccessor, Outcome};
pub use coerce::coerce;
pub use host_type::{
    HostObject, HostType, HostTypeBuilder, MemberFailure, MemberScope, Storage, Target, TargetMut,
    Visibility,
};
pub use value::{HostValue, ObjectRef, Value, ValueKind};

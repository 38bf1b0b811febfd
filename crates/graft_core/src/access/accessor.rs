// accessor.rs - String-keyed member access over host objects
//
// Every operation is total. Failures are logged at the boundary and handed
// back inside an `Outcome` next to the default value, so callers can either
// ignore them (and carry on with the default) or assert on them.

use crate::access::{
    coerce, AccessError, AccessMode, HostType, HostValue, MemberFailure, MemberKind, MemberScope,
    Target, TargetMut, Value,
};
use std::any::Any;

/// Result of a total operation: always a value, sometimes an error.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    value: T,
    error: Option<AccessError>,
}

impl<T> Outcome<T> {
    pub fn ok(value: T) -> Self {
        Self { value, error: None }
    }

    pub fn failed(value: T, error: AccessError) -> Self {
        Self {
            value,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<&AccessError> {
        self.error.as_ref()
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn into_result(self) -> Result<T, AccessError> {
        match self.error {
            None => Ok(self.value),
            Some(error) => Err(error),
        }
    }
}

/// Reads, writes and invokes host members by name.
///
/// Holds nothing but the default lookup scope, so it is `Copy` and cheap to
/// hand around.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberAccessor {
    scope: MemberScope,
}

impl MemberAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(scope: MemberScope) -> Self {
        Self { scope }
    }

    /// A copy of this accessor that looks members up in `scope`.
    pub fn scoped(&self, scope: MemberScope) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> MemberScope {
        self.scope
    }

    pub fn get_field<T, R>(&self, target: &R, name: &str) -> Outcome<T>
    where
        T: HostValue + Default,
        R: Target + ?Sized,
    {
        let result = self
            .read(target, name, MemberKind::Field, "get_field")
            .and_then(|value| convert_read::<T>(name, value));
        settle("get_field", result)
    }

    pub fn set_field<R>(&self, target: &mut R, name: &str, value: impl Into<Value>) -> Outcome<bool>
    where
        R: TargetMut + ?Sized,
    {
        let result = self.write(target, name, value.into(), MemberKind::Field, "set_field");
        settle("set_field", result.map(|()| true))
    }

    pub fn get_property<T, R>(&self, target: &R, name: &str) -> Outcome<T>
    where
        T: HostValue + Default,
        R: Target + ?Sized,
    {
        let result = self
            .read(target, name, MemberKind::Property, "get_property")
            .and_then(|value| convert_read::<T>(name, value));
        settle("get_property", result)
    }

    pub fn set_property<R>(
        &self,
        target: &mut R,
        name: &str,
        value: impl Into<Value>,
    ) -> Outcome<bool>
    where
        R: TargetMut + ?Sized,
    {
        let result = self.write(target, name, value.into(), MemberKind::Property, "set_property");
        settle("set_property", result.map(|()| true))
    }

    /// Invoke the overload of `name` whose parameters match the runtime
    /// kinds of `args`.
    pub fn invoke_method<T, R>(&self, target: &mut R, name: &str, args: Vec<Value>) -> Outcome<T>
    where
        T: HostValue + Default,
        R: TargetMut + ?Sized,
    {
        let result = self
            .invoke(target, name, args)
            .and_then(|value| convert_read::<T>(name, value));
        settle("invoke_method", result)
    }

    fn read<R: Target + ?Sized>(
        &self,
        target: &R,
        name: &str,
        kind: MemberKind,
        operation: &'static str,
    ) -> Result<Value, AccessError> {
        let object = target.resolve().ok_or_else(|| AccessError::NullTarget {
            operation,
            member: name.to_string(),
        })?;
        let host_type = object.host_type();
        let scope = self.scope;

        let (getter, owner) = match kind {
            MemberKind::Field => {
                let (field, owner) = locate(host_type, object.as_any(), |ty| {
                    ty.own_field(name, scope)
                })
                .ok_or_else(|| not_found(host_type, name, kind))?;
                (&field.get, owner)
            }
            _ => {
                let (property, owner) = locate(host_type, object.as_any(), |ty| {
                    ty.own_property(name, scope)
                })
                .ok_or_else(|| not_found(host_type, name, kind))?;
                let getter = property.get.as_ref().ok_or(AccessError::AccessDenied {
                    host_type: host_type.name(),
                    member: name.to_string(),
                    mode: AccessMode::Read,
                })?;
                (getter, owner)
            }
        };

        getter(owner).ok_or_else(|| AccessError::TargetMismatch {
            host_type: host_type.name(),
            member: name.to_string(),
        })
    }

    fn write<R: TargetMut + ?Sized>(
        &self,
        target: &mut R,
        name: &str,
        value: Value,
        kind: MemberKind,
        operation: &'static str,
    ) -> Result<(), AccessError> {
        let object = target.resolve_mut().ok_or_else(|| AccessError::NullTarget {
            operation,
            member: name.to_string(),
        })?;
        let host_type = object.host_type();
        let scope = self.scope;

        let (setter, declared, owner) = match kind {
            MemberKind::Field => {
                let (field, owner) = locate_mut(host_type, object.as_any_mut(), |ty| {
                    ty.own_field(name, scope)
                })
                .ok_or_else(|| not_found(host_type, name, kind))?;
                (&field.set, &field.kind, owner)
            }
            _ => {
                let (property, owner) = locate_mut(host_type, object.as_any_mut(), |ty| {
                    ty.own_property(name, scope)
                })
                .ok_or_else(|| not_found(host_type, name, kind))?;
                let setter = property.set.as_ref().ok_or(AccessError::AccessDenied {
                    host_type: host_type.name(),
                    member: name.to_string(),
                    mode: AccessMode::Write,
                })?;
                (setter, &property.kind, owner)
            }
        };

        let from = value.kind();
        let value = coerce(value, declared).map_err(|_| AccessError::TypeCoercion {
            member: name.to_string(),
            from: from.clone(),
            to: declared.clone(),
        })?;

        setter(owner, value).map_err(|failure| match failure {
            MemberFailure::WrongTarget => AccessError::TargetMismatch {
                host_type: host_type.name(),
                member: name.to_string(),
            },
            MemberFailure::Rejected(_) | MemberFailure::Failed(_) => AccessError::TypeCoercion {
                member: name.to_string(),
                from,
                to: declared.clone(),
            },
        })
    }

    fn invoke<R: TargetMut + ?Sized>(
        &self,
        target: &mut R,
        name: &str,
        args: Vec<Value>,
    ) -> Result<Value, AccessError> {
        let object = target.resolve_mut().ok_or_else(|| AccessError::NullTarget {
            operation: "invoke_method",
            member: name.to_string(),
        })?;
        let host_type = object.host_type();
        let scope = self.scope;

        let mut current = host_type;
        let mut owner: &mut dyn Any = object.as_any_mut();
        loop {
            let mut candidates = current.own_methods(name, scope).filter(|m| m.matches(&args));
            if let Some(method) = candidates.next() {
                let extra = candidates.count();
                if extra > 0 {
                    return Err(AccessError::AmbiguousMethod {
                        host_type: current.name(),
                        member: name.to_string(),
                        candidates: extra + 1,
                    });
                }
                return (method.invoke)(owner, args).map_err(|failure| match failure {
                    MemberFailure::WrongTarget => AccessError::TargetMismatch {
                        host_type: current.name(),
                        member: name.to_string(),
                    },
                    MemberFailure::Failed(reason) => AccessError::Invocation {
                        host_type: current.name(),
                        member: name.to_string(),
                        reason,
                    },
                    MemberFailure::Rejected(value) => AccessError::Invocation {
                        host_type: current.name(),
                        member: name.to_string(),
                        reason: format!("argument {value} rejected"),
                    },
                });
            }

            let Some(link) = current.base_link() else {
                return Err(not_found(host_type, name, MemberKind::Method));
            };
            owner = (link.project_mut)(owner).ok_or_else(|| AccessError::TargetMismatch {
                host_type: current.name(),
                member: name.to_string(),
            })?;
            current = link.host_type;
        }
    }
}

/// Find the first type in the chain owning a matching member, projecting the
/// object down to the embedded base struct along the way.
fn locate<'o, M: ?Sized>(
    host_type: &'static HostType,
    object: &'o dyn Any,
    find: impl Fn(&'static HostType) -> Option<&'static M>,
) -> Option<(&'static M, &'o dyn Any)> {
    let mut current = host_type;
    let mut owner = object;
    loop {
        if let Some(member) = find(current) {
            return Some((member, owner));
        }
        let link = current.base_link()?;
        owner = (link.project)(owner)?;
        current = link.host_type;
    }
}

fn locate_mut<'o, M: ?Sized>(
    host_type: &'static HostType,
    object: &'o mut dyn Any,
    find: impl Fn(&'static HostType) -> Option<&'static M>,
) -> Option<(&'static M, &'o mut dyn Any)> {
    let mut current = host_type;
    let mut owner = object;
    loop {
        if let Some(member) = find(current) {
            return Some((member, owner));
        }
        let link = current.base_link()?;
        owner = (link.project_mut)(owner)?;
        current = link.host_type;
    }
}

fn not_found(host_type: &HostType, name: &str, member_kind: MemberKind) -> AccessError {
    AccessError::MemberNotFound {
        host_type: host_type.name(),
        member: name.to_string(),
        member_kind,
    }
}

fn convert_read<T: HostValue + Default>(member: &str, value: Value) -> Result<T, AccessError> {
    if value.is_null() {
        return Ok(T::default());
    }
    let from = value.kind();
    let to = T::kind();
    coerce(value, &to)
        .and_then(T::from_value)
        .map_err(|_| AccessError::TypeCoercion {
            member: member.to_string(),
            from,
            to,
        })
}

fn settle<T: Default>(operation: &'static str, result: Result<T, AccessError>) -> Outcome<T> {
    match result {
        Ok(value) => Outcome::ok(value),
        Err(error) => {
            tracing::error!(operation, kind = %error.kind(), "{error}");
            Outcome::failed(T::default(), error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{HostObject, HostType, ValueKind, Visibility};
    use crate::{host_object, ErrorKind};
    use once_cell::sync::Lazy;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Base {
        id: i32,
        label: String,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Derived {
        base: Base,
        weight: f32,
        count: i32,
        secret: Option<String>,
        calls: Vec<String>,
    }

    static BASE_TYPE: Lazy<HostType> = Lazy::new(|| {
        HostType::builder::<Base>("Base")
            .field("id", Visibility::Private, |b: &Base| b.id, |b, v| b.id = v)
            .property("Label", Visibility::Public, |b: &Base| b.label.clone(), |b, v| b.label = v)
            .method(
                "Describe",
                Visibility::Public,
                &[],
                ValueKind::Str,
                |b: &mut Base, _| Ok(Value::Str(format!("base {}", b.id))),
            )
            .build()
    });

    static DERIVED_TYPE: Lazy<HostType> = Lazy::new(|| {
        HostType::builder::<Derived>("Derived")
            .extends(&BASE_TYPE, |d: &Derived| &d.base, |d: &mut Derived| &mut d.base)
            .field("weight", Visibility::Private, |d: &Derived| d.weight, |d, v| d.weight = v)
            .field("secret", Visibility::Private, |d: &Derived| d.secret.clone(), |d, v| d.secret = v)
            .readonly_property("Count", Visibility::Public, |d: &Derived| d.count)
            .writeonly_property("Sink", Visibility::Public, |d: &mut Derived, v: String| {
                d.calls.push(v)
            })
            .static_property("Version", Visibility::Public, || 3)
            .method(
                "Record",
                Visibility::Public,
                &[ValueKind::Int],
                ValueKind::Str,
                |d: &mut Derived, args| match args.as_slice() {
                    [Value::Int(v)] => {
                        d.calls.push(format!("int:{v}"));
                        Ok(Value::from("int"))
                    }
                    _ => Err("unexpected arguments".to_string()),
                },
            )
            .method(
                "Record",
                Visibility::Public,
                &[ValueKind::Str],
                ValueKind::Str,
                |d: &mut Derived, args| match args.as_slice() {
                    [Value::Str(v)] => {
                        d.calls.push(format!("str:{v}"));
                        Ok(Value::from("str"))
                    }
                    _ => Err("unexpected arguments".to_string()),
                },
            )
            .method(
                "Either",
                Visibility::Public,
                &[ValueKind::Str],
                ValueKind::Bool,
                |_: &mut Derived, _| Ok(Value::Bool(true)),
            )
            .method(
                "Either",
                Visibility::Public,
                &[ValueKind::List],
                ValueKind::Bool,
                |_: &mut Derived, _| Ok(Value::Bool(false)),
            )
            .method(
                "Explode",
                Visibility::Private,
                &[],
                ValueKind::Any,
                |_: &mut Derived, _| Err("boom".to_string()),
            )
            .build()
    });

    host_object!(Base => BASE_TYPE);
    host_object!(Derived => DERIVED_TYPE);

    fn sample() -> Derived {
        Derived {
            base: Base {
                id: 7,
                label: "crate".to_string(),
            },
            weight: 0.5,
            count: 3,
            ..Default::default()
        }
    }

    #[test]
    fn reads_own_and_inherited_fields() {
        let accessor = MemberAccessor::new();
        let derived = sample();

        assert_eq!(accessor.get_field::<f32, _>(&derived, "weight").into_value(), 0.5);
        assert_eq!(accessor.get_field::<i32, _>(&derived, "id").into_value(), 7);
        assert_eq!(
            accessor.get_property::<String, _>(&derived, "Label").into_value(),
            "crate"
        );
    }

    #[test]
    fn missing_member_yields_default_and_error() {
        let accessor = MemberAccessor::new();
        let derived = sample();

        let outcome = accessor.get_field::<i32, _>(&derived, "missing");
        assert_eq!(*outcome.value(), 0);
        assert_eq!(outcome.error().map(AccessError::kind), Some(ErrorKind::MemberNotFound));
    }

    #[test]
    fn null_target_is_reported_not_raised() {
        let accessor = MemberAccessor::new();
        let mut nothing: Option<Derived> = None;

        let read = accessor.get_field::<i32, _>(&nothing, "id");
        assert_eq!(read.error().map(AccessError::kind), Some(ErrorKind::NullTarget));

        let write = accessor.set_field(&mut nothing, "id", 1);
        assert!(!write.value());
        assert_eq!(write.error().map(AccessError::kind), Some(ErrorKind::NullTarget));
    }

    #[test]
    fn read_coerces_between_scalars() {
        let accessor = MemberAccessor::new();
        let derived = sample();

        assert_eq!(accessor.get_field::<String, _>(&derived, "id").into_value(), "7");
        assert_eq!(accessor.get_field::<f64, _>(&derived, "id").into_value(), 7.0);

        let failed = accessor.get_field::<Vec<i32>, _>(&derived, "id");
        assert_eq!(failed.error().map(AccessError::kind), Some(ErrorKind::TypeCoercion));
        assert!(failed.value().is_empty());
    }

    #[test]
    fn null_reads_as_default_without_error() {
        let accessor = MemberAccessor::new();
        let derived = sample();

        let outcome = accessor.get_field::<String, _>(&derived, "secret");
        assert!(outcome.is_ok());
        assert_eq!(outcome.into_value(), "");
    }

    #[test]
    fn write_coerces_or_leaves_member_unchanged() {
        let accessor = MemberAccessor::new();
        let mut derived = sample();

        assert!(accessor.set_field(&mut derived, "id", "12").into_value());
        assert_eq!(derived.base.id, 12);

        assert!(accessor.set_field(&mut derived, "weight", 2).into_value());
        assert_eq!(derived.weight, 2.0);

        let rejected = accessor.set_field(&mut derived, "id", "twelve");
        assert!(!rejected.value());
        assert_eq!(rejected.error().map(AccessError::kind), Some(ErrorKind::TypeCoercion));
        assert_eq!(derived.base.id, 12);

        let overflow = accessor.set_field(&mut derived, "id", i64::MAX);
        assert_eq!(overflow.error().map(AccessError::kind), Some(ErrorKind::TypeCoercion));
        assert_eq!(derived.base.id, 12);

        let null_int = accessor.set_field(&mut derived, "id", Value::Null);
        assert_eq!(null_int.error().map(AccessError::kind), Some(ErrorKind::TypeCoercion));
    }

    #[test]
    fn nullable_field_accepts_null() {
        let accessor = MemberAccessor::new();
        let mut derived = sample();
        derived.secret = Some("x".to_string());

        assert!(accessor.set_field(&mut derived, "secret", Value::Null).into_value());
        assert_eq!(derived.secret, None);
    }

    #[test]
    fn property_directions_are_enforced() {
        let accessor = MemberAccessor::new();
        let mut derived = sample();

        let write = accessor.set_property(&mut derived, "Count", 9);
        assert_eq!(write.error().map(AccessError::kind), Some(ErrorKind::AccessDenied));
        assert_eq!(derived.count, 3);

        let read = accessor.get_property::<String, _>(&derived, "Sink");
        assert_eq!(read.error().map(AccessError::kind), Some(ErrorKind::AccessDenied));

        assert!(accessor.set_property(&mut derived, "Sink", "hello").into_value());
        assert_eq!(derived.calls, vec!["hello".to_string()]);
    }

    #[test]
    fn fields_and_properties_are_separate_namespaces() {
        let accessor = MemberAccessor::new();
        let derived = sample();

        let outcome = accessor.get_field::<i32, _>(&derived, "Count");
        assert_eq!(outcome.error().map(AccessError::kind), Some(ErrorKind::MemberNotFound));
    }

    #[test]
    fn scope_filters_members() {
        let derived = sample();
        let public_only = MemberAccessor::with_scope(MemberScope::PUBLIC | MemberScope::INSTANCE);

        let hidden = public_only.get_field::<f32, _>(&derived, "weight");
        assert_eq!(hidden.error().map(AccessError::kind), Some(ErrorKind::MemberNotFound));

        let no_static = public_only.get_property::<i32, _>(&derived, "Version");
        assert_eq!(no_static.error().map(AccessError::kind), Some(ErrorKind::MemberNotFound));

        let with_static = public_only.scoped(MemberScope::PUBLIC | MemberScope::STATIC);
        assert_eq!(with_static.get_property::<i32, _>(&derived, "Version").into_value(), 3);
    }

    #[test]
    fn overloads_resolve_by_argument_kind() {
        let accessor = MemberAccessor::new();
        let mut derived = sample();

        let by_int = accessor.invoke_method::<String, _>(&mut derived, "Record", vec![Value::Int(4)]);
        assert_eq!(by_int.into_value(), "int");
        let by_str =
            accessor.invoke_method::<String, _>(&mut derived, "Record", vec![Value::from("a")]);
        assert_eq!(by_str.into_value(), "str");
        assert_eq!(derived.calls, vec!["int:4".to_string(), "str:a".to_string()]);

        let no_match =
            accessor.invoke_method::<String, _>(&mut derived, "Record", vec![Value::Bool(true)]);
        assert_eq!(no_match.error().map(AccessError::kind), Some(ErrorKind::MemberNotFound));
    }

    #[test]
    fn null_argument_can_be_ambiguous() {
        let accessor = MemberAccessor::new();
        let mut derived = sample();

        let outcome = accessor.invoke_method::<bool, _>(&mut derived, "Either", vec![Value::Null]);
        assert!(matches!(
            outcome.error(),
            Some(AccessError::AmbiguousMethod { candidates: 2, .. })
        ));
        assert_eq!(outcome.error().map(AccessError::kind), Some(ErrorKind::MemberNotFound));
    }

    #[test]
    fn inherited_methods_run_against_the_base() {
        let accessor = MemberAccessor::new();
        let mut derived = sample();

        let outcome = accessor.invoke_method::<String, _>(&mut derived, "Describe", Vec::new());
        assert_eq!(outcome.into_value(), "base 7");
    }

    #[test]
    fn failing_method_reports_invocation_error() {
        let accessor = MemberAccessor::new();
        let mut derived = sample();

        let outcome = accessor.invoke_method::<Value, _>(&mut derived, "Explode", Vec::new());
        assert_eq!(outcome.error().map(AccessError::kind), Some(ErrorKind::Invocation));
        assert_eq!(outcome.into_value(), Value::Null);
    }

    #[test]
    fn works_through_trait_objects() {
        let accessor = MemberAccessor::new();
        let mut boxed: Box<dyn HostObject> = Box::new(sample());

        assert!(accessor.set_field(&mut boxed, "id", 99).into_value());
        assert_eq!(accessor.get_field::<i32, _>(&boxed, "id").into_value(), 99);
    }

    #[test]
    fn host_type_lookups() {
        let ty: &HostType = &DERIVED_TYPE;
        assert!(ty.is_a("Base"));
        assert!(ty.has_field("id", MemberScope::all()));
        assert!(!ty.has_field("id", MemberScope::PUBLIC | MemberScope::INSTANCE));
        assert!(ty.has_property("Label", MemberScope::all()));
        assert!(ty.has_method("Record", Some(&[ValueKind::Str]), MemberScope::all()));
        assert!(!ty.has_method("Record", Some(&[ValueKind::Float]), MemberScope::all()));
    }
}

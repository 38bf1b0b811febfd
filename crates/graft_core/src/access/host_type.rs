// host_type.rs - Descriptors for host object layouts
//
// Each host type registers its members once, by name, together with the
// closures that read and write them. A type may name a base type plus a
// projection from the derived struct to the embedded base struct; lookups
// walk that chain the way a class hierarchy would.

use crate::access::{HostValue, Value, ValueKind};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

bitflags! {
    /// Which members participate in a lookup.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MemberScope: u8 {
        const PUBLIC = 1 << 0;
        const NON_PUBLIC = 1 << 1;
        const INSTANCE = 1 << 2;
        const STATIC = 1 << 3;
    }
}

impl Default for MemberScope {
    fn default() -> Self {
        MemberScope::all()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Storage {
    Instance,
    Static,
}

/// Why a setter or invoker refused to run.
#[derive(Debug)]
pub enum MemberFailure {
    /// The object handed over is not the type the descriptor was built for.
    WrongTarget,
    /// The value did not fit the member; the value is handed back.
    Rejected(Value),
    /// A method body reported an error.
    Failed(String),
}

pub type Getter = Box<dyn Fn(&dyn Any) -> Option<Value> + Send + Sync>;
pub type Setter = Box<dyn Fn(&mut dyn Any, Value) -> Result<(), MemberFailure> + Send + Sync>;
pub type Invoker =
    Box<dyn Fn(&mut dyn Any, Vec<Value>) -> Result<Value, MemberFailure> + Send + Sync>;
type Project = Box<dyn Fn(&dyn Any) -> Option<&dyn Any> + Send + Sync>;
type ProjectMut = Box<dyn Fn(&mut dyn Any) -> Option<&mut dyn Any> + Send + Sync>;

pub struct FieldDef {
    pub(crate) name: &'static str,
    pub(crate) kind: ValueKind,
    pub(crate) visibility: Visibility,
    pub(crate) storage: Storage,
    pub(crate) get: Getter,
    pub(crate) set: Setter,
}

pub struct PropertyDef {
    pub(crate) name: &'static str,
    pub(crate) kind: ValueKind,
    pub(crate) visibility: Visibility,
    pub(crate) storage: Storage,
    pub(crate) get: Option<Getter>,
    pub(crate) set: Option<Setter>,
}

pub struct MethodDef {
    pub(crate) name: &'static str,
    pub(crate) params: Vec<ValueKind>,
    pub(crate) returns: ValueKind,
    pub(crate) visibility: Visibility,
    pub(crate) storage: Storage,
    pub(crate) invoke: Invoker,
}

impl MethodDef {
    /// Exact-kind match of every argument; null matches nullable parameters.
    pub(crate) fn matches(&self, args: &[Value]) -> bool {
        self.params.len() == args.len()
            && self
                .params
                .iter()
                .zip(args)
                .all(|(param, arg)| match arg {
                    Value::Null => param.is_nullable(),
                    arg => *param == ValueKind::Any || param.accepts(arg),
                })
    }

    pub fn returns(&self) -> &ValueKind {
        &self.returns
    }
}

pub(crate) struct BaseLink {
    pub(crate) host_type: &'static HostType,
    pub(crate) project: Project,
    pub(crate) project_mut: ProjectMut,
}

/// Registered layout of one host type.
pub struct HostType {
    name: &'static str,
    base: Option<BaseLink>,
    fields: Vec<FieldDef>,
    properties: Vec<PropertyDef>,
    methods: Vec<MethodDef>,
}

fn admitted(visibility: Visibility, storage: Storage, scope: MemberScope) -> bool {
    let visible = match visibility {
        Visibility::Public => scope.contains(MemberScope::PUBLIC),
        Visibility::Private => scope.contains(MemberScope::NON_PUBLIC),
    };
    let stored = match storage {
        Storage::Instance => scope.contains(MemberScope::INSTANCE),
        Storage::Static => scope.contains(MemberScope::STATIC),
    };
    visible && stored
}

impl HostType {
    /// Start describing the host type backed by the Rust type `T`.
    pub fn builder<T: 'static>(name: &'static str) -> HostTypeBuilder<T> {
        HostTypeBuilder {
            ty: HostType {
                name,
                base: None,
                fields: Vec::new(),
                properties: Vec::new(),
                methods: Vec::new(),
            },
            _marker: std::marker::PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn base(&self) -> Option<&'static HostType> {
        self.base.as_ref().map(|link| link.host_type)
    }

    pub(crate) fn base_link(&self) -> Option<&BaseLink> {
        self.base.as_ref()
    }

    /// Whether this type is `name` or derives from it.
    pub fn is_a(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(ty) = current {
            if ty.name == name {
                return true;
            }
            current = ty.base.as_ref().map(|link| link.host_type);
        }
        false
    }

    pub(crate) fn own_field(&self, name: &str, scope: MemberScope) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.name == name && admitted(f.visibility, f.storage, scope))
    }

    pub(crate) fn own_property(&self, name: &str, scope: MemberScope) -> Option<&PropertyDef> {
        self.properties
            .iter()
            .find(|p| p.name == name && admitted(p.visibility, p.storage, scope))
    }

    pub(crate) fn own_methods<'a>(
        &'a self,
        name: &'a str,
        scope: MemberScope,
    ) -> impl Iterator<Item = &'a MethodDef> + 'a {
        self.methods
            .iter()
            .filter(move |m| m.name == name && admitted(m.visibility, m.storage, scope))
    }

    /// Walk this type and its bases, returning the first type for which
    /// `matcher` succeeds.
    fn find_in_chain<M>(&self, matcher: impl Fn(&HostType) -> Option<M>) -> Option<M> {
        let mut current = Some(self);
        while let Some(ty) = current {
            if let Some(found) = matcher(ty) {
                return Some(found);
            }
            current = ty.base.as_ref().map(|link| link.host_type);
        }
        None
    }

    pub fn has_field(&self, name: &str, scope: MemberScope) -> bool {
        self.find_in_chain(|ty| ty.own_field(name, scope).map(|_| ()))
            .is_some()
    }

    pub fn has_property(&self, name: &str, scope: MemberScope) -> bool {
        self.find_in_chain(|ty| ty.own_property(name, scope).map(|_| ()))
            .is_some()
    }

    /// Whether a method of that name exists; with `params`, only an overload
    /// with exactly those parameter kinds counts.
    pub fn has_method(&self, name: &str, params: Option<&[ValueKind]>, scope: MemberScope) -> bool {
        self.find_in_chain(|ty| {
            ty.own_methods(name, scope)
                .any(|m| params.map_or(true, |p| m.params == p))
                .then_some(())
        })
        .is_some()
    }
}

impl fmt::Debug for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostType")
            .field("name", &self.name)
            .field("base", &self.base().map(HostType::name))
            .field("fields", &self.fields.len())
            .field("properties", &self.properties.len())
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// Typed registration of members for the Rust type `T`.
pub struct HostTypeBuilder<T> {
    ty: HostType,
    _marker: std::marker::PhantomData<fn() -> T>,
}

fn projection<P>(project: P) -> P
where
    P: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any>,
{
    project
}

fn projection_mut<P>(project: P) -> P
where
    P: for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any>,
{
    project
}

fn typed_getter<T: 'static, F: HostValue>(
    get: impl Fn(&T) -> F + Send + Sync + 'static,
) -> Getter {
    Box::new(move |object: &dyn Any| object.downcast_ref::<T>().map(|t| get(t).into_value()))
}

fn typed_setter<T: 'static, F: HostValue>(
    set: impl Fn(&mut T, F) + Send + Sync + 'static,
) -> Setter {
    Box::new(move |object: &mut dyn Any, value: Value| {
        let target = object
            .downcast_mut::<T>()
            .ok_or(MemberFailure::WrongTarget)?;
        let value = F::from_value(value).map_err(MemberFailure::Rejected)?;
        set(target, value);
        Ok(())
    })
}

impl<T: 'static> HostTypeBuilder<T> {
    /// Declare the base type embedded in `T`.
    pub fn extends<B: 'static>(
        mut self,
        base: &'static HostType,
        project: fn(&T) -> &B,
        project_mut: fn(&mut T) -> &mut B,
    ) -> Self {
        self.ty.base = Some(BaseLink {
            host_type: base,
            project: Box::new(projection(move |object| {
                object
                    .downcast_ref::<T>()
                    .map(|t| project(t) as &dyn Any)
            })),
            project_mut: Box::new(projection_mut(move |object| {
                object
                    .downcast_mut::<T>()
                    .map(|t| project_mut(t) as &mut dyn Any)
            })),
        });
        self
    }

    /// Instance field; fields are always readable and writable.
    pub fn field<F: HostValue + 'static>(
        mut self,
        name: &'static str,
        visibility: Visibility,
        get: impl Fn(&T) -> F + Send + Sync + 'static,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
    ) -> Self {
        self.ty.fields.push(FieldDef {
            name,
            kind: F::kind(),
            visibility,
            storage: Storage::Instance,
            get: typed_getter(get),
            set: typed_setter(set),
        });
        self
    }

    /// Instance property with both accessors.
    pub fn property<F: HostValue + 'static>(
        mut self,
        name: &'static str,
        visibility: Visibility,
        get: impl Fn(&T) -> F + Send + Sync + 'static,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
    ) -> Self {
        self.ty.properties.push(PropertyDef {
            name,
            kind: F::kind(),
            visibility,
            storage: Storage::Instance,
            get: Some(typed_getter(get)),
            set: Some(typed_setter(set)),
        });
        self
    }

    pub fn readonly_property<F: HostValue + 'static>(
        mut self,
        name: &'static str,
        visibility: Visibility,
        get: impl Fn(&T) -> F + Send + Sync + 'static,
    ) -> Self {
        self.ty.properties.push(PropertyDef {
            name,
            kind: F::kind(),
            visibility,
            storage: Storage::Instance,
            get: Some(typed_getter(get)),
            set: None,
        });
        self
    }

    pub fn writeonly_property<F: HostValue + 'static>(
        mut self,
        name: &'static str,
        visibility: Visibility,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
    ) -> Self {
        self.ty.properties.push(PropertyDef {
            name,
            kind: F::kind(),
            visibility,
            storage: Storage::Instance,
            get: None,
            set: Some(typed_setter(set)),
        });
        self
    }

    /// Read-only static property; the getter ignores the instance.
    pub fn static_property<F: HostValue + 'static>(
        mut self,
        name: &'static str,
        visibility: Visibility,
        get: impl Fn() -> F + Send + Sync + 'static,
    ) -> Self {
        self.ty.properties.push(PropertyDef {
            name,
            kind: F::kind(),
            visibility,
            storage: Storage::Static,
            get: Some(Box::new(move |_: &dyn Any| Some(get().into_value()))),
            set: None,
        });
        self
    }

    /// Instance method taking raw arguments.
    ///
    /// The accessor only invokes `body` once every argument matches `params`,
    /// so bodies may pattern-match on the expected variants.
    pub fn method(
        mut self,
        name: &'static str,
        visibility: Visibility,
        params: &[ValueKind],
        returns: ValueKind,
        body: impl Fn(&mut T, Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        self.ty.methods.push(MethodDef {
            name,
            params: params.to_vec(),
            returns,
            visibility,
            storage: Storage::Instance,
            invoke: Box::new(move |object: &mut dyn Any, args: Vec<Value>| {
                let target = object
                    .downcast_mut::<T>()
                    .ok_or(MemberFailure::WrongTarget)?;
                body(target, args).map_err(MemberFailure::Failed)
            }),
        });
        self
    }

    /// Static method taking raw arguments.
    pub fn static_method(
        mut self,
        name: &'static str,
        visibility: Visibility,
        params: &[ValueKind],
        returns: ValueKind,
        body: impl Fn(Vec<Value>) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        self.ty.methods.push(MethodDef {
            name,
            params: params.to_vec(),
            returns,
            visibility,
            storage: Storage::Static,
            invoke: Box::new(move |_: &mut dyn Any, args: Vec<Value>| {
                body(args).map_err(MemberFailure::Failed)
            }),
        });
        self
    }

    pub fn build(self) -> HostType {
        self.ty
    }
}

/// An object whose internal state is reachable through a `HostType`.
///
/// Implemented with `host_object!`.
pub trait HostObject: Any + fmt::Debug {
    fn host_type(&self) -> &'static HostType;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_object(&self) -> Box<dyn HostObject>;
    fn object_eq(&self, other: &dyn HostObject) -> bool;
}

impl Clone for Box<dyn HostObject> {
    fn clone(&self) -> Self {
        self.clone_object()
    }
}

/// Something that may or may not hold a host object to read from.
pub trait Target {
    fn resolve(&self) -> Option<&dyn HostObject>;
}

/// Something that may or may not hold a host object to write to.
pub trait TargetMut {
    fn resolve_mut(&mut self) -> Option<&mut dyn HostObject>;
}

impl Target for dyn HostObject {
    fn resolve(&self) -> Option<&dyn HostObject> {
        Some(self)
    }
}

impl TargetMut for dyn HostObject {
    fn resolve_mut(&mut self) -> Option<&mut dyn HostObject> {
        Some(self)
    }
}

impl<T: Target + ?Sized> Target for Box<T> {
    fn resolve(&self) -> Option<&dyn HostObject> {
        (**self).resolve()
    }
}

impl<T: TargetMut + ?Sized> TargetMut for Box<T> {
    fn resolve_mut(&mut self) -> Option<&mut dyn HostObject> {
        (**self).resolve_mut()
    }
}

impl<T: Target> Target for Option<T> {
    fn resolve(&self) -> Option<&dyn HostObject> {
        self.as_ref().and_then(Target::resolve)
    }
}

impl<T: TargetMut> TargetMut for Option<T> {
    fn resolve_mut(&mut self) -> Option<&mut dyn HostObject> {
        self.as_mut().and_then(TargetMut::resolve_mut)
    }
}

impl<T: Target + ?Sized> Target for &T {
    fn resolve(&self) -> Option<&dyn HostObject> {
        (**self).resolve()
    }
}

impl<T: TargetMut + ?Sized> TargetMut for &mut T {
    fn resolve_mut(&mut self) -> Option<&mut dyn HostObject> {
        (**self).resolve_mut()
    }
}

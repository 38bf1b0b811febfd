// value.rs - Tagged values flowing through the member access layer
//
// Host members are read and written as `Value`s. Typed Rust values cross the
// boundary through the `HostValue` trait, which knows the declared kind and
// how to convert in both directions without coercion.

use crate::access::HostObject;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBJECT: AtomicU64 = AtomicU64::new(1);

/// Weak reference to a host object by identity.
///
/// Holding an `ObjectRef` never keeps the referenced object alive; it is the
/// back-reference sub-components use to name the entity that owns them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(u64);

impl ObjectRef {
    /// Allocate a fresh, process-unique identity.
    pub fn next() -> Self {
        Self(NEXT_OBJECT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Runtime or declared kind of a value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Accepts every value, including null.
    Any,
    /// Runtime kind of `Value::Null`; never used as a declared kind.
    Null,
    Bool,
    Int,
    Float,
    Str,
    List,
    Ref,
    /// Host object of the named type or one of its derived types.
    Object(&'static str),
}

impl ValueKind {
    /// Whether a member declared with this kind can hold null.
    pub fn is_nullable(&self) -> bool {
        matches!(
            self,
            ValueKind::Any | ValueKind::Str | ValueKind::List | ValueKind::Ref | ValueKind::Object(_)
        )
    }

    /// Whether `value` can be stored under this kind without coercion.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueKind::Any, _) => true,
            (kind, Value::Null) => kind.is_nullable(),
            (ValueKind::Bool, Value::Bool(_))
            | (ValueKind::Int, Value::Int(_))
            | (ValueKind::Float, Value::Float(_))
            | (ValueKind::Str, Value::Str(_))
            | (ValueKind::List, Value::List(_))
            | (ValueKind::Ref, Value::Ref(_)) => true,
            (ValueKind::Object(name), Value::Object(object)) => object.host_type().is_a(name),
            _ => false,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Any => f.write_str("any"),
            ValueKind::Null => f.write_str("null"),
            ValueKind::Bool => f.write_str("bool"),
            ValueKind::Int => f.write_str("int"),
            ValueKind::Float => f.write_str("float"),
            ValueKind::Str => f.write_str("string"),
            ValueKind::List => f.write_str("list"),
            ValueKind::Ref => f.write_str("ref"),
            ValueKind::Object(name) => f.write_str(name),
        }
    }
}

/// A value read from or written to a host member.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Ref(ObjectRef),
    Object(Box<dyn HostObject>),
}

impl Value {
    /// Wrap a host object.
    pub fn object(object: impl HostObject) -> Self {
        Value::Object(Box::new(object))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::List(_) => ValueKind::List,
            Value::Ref(_) => ValueKind::Ref,
            Value::Object(object) => ValueKind::Object(object.host_type().name()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Scalar values that key-value stores accept.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_)
        )
    }

    pub fn as_object(&self) -> Option<&dyn HostObject> {
        match self {
            Value::Object(object) => Some(object.as_ref()),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut dyn HostObject> {
        match self {
            Value::Object(object) => Some(object.as_mut()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.object_eq(b.as_ref()),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::List(items) => write!(f, "[{} items]", items.len()),
            Value::Ref(r) => write!(f, "{r}"),
            Value::Object(object) => write!(f, "<{}>", object.host_type().name()),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => |$v:ident| $body:expr),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $body
                }
            }
        )+
    };
}

value_from! {
    bool => |v| Value::Bool(v),
    i32 => |v| Value::Int(v as i64),
    i64 => |v| Value::Int(v),
    u32 => |v| Value::Int(v as i64),
    f32 => |v| Value::Float(v as f64),
    f64 => |v| Value::Float(v),
    String => |v| Value::Str(v),
    &str => |v| Value::Str(v.to_string()),
    ObjectRef => |v| Value::Ref(v),
    Vec<Value> => |v| Value::List(v),
    Box<dyn HostObject> => |v| Value::Object(v),
}

/// Conversion between Rust values and `Value` for a fixed declared kind.
///
/// `from_value` performs no coercion: it fails (handing the value back) when
/// the kind or range does not fit. Coercion happens before it is called.
pub trait HostValue: Sized {
    fn kind() -> ValueKind;
    fn from_value(value: Value) -> Result<Self, Value>;
    fn into_value(self) -> Value;
}

impl HostValue for Value {
    fn kind() -> ValueKind {
        ValueKind::Any
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        Ok(value)
    }

    fn into_value(self) -> Value {
        self
    }
}

impl HostValue for bool {
    fn kind() -> ValueKind {
        ValueKind::Bool
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(other),
        }
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

macro_rules! host_value_int {
    ($($ty:ty),+) => {
        $(
            impl HostValue for $ty {
                fn kind() -> ValueKind {
                    ValueKind::Int
                }

                fn from_value(value: Value) -> Result<Self, Value> {
                    match value {
                        Value::Int(v) => <$ty>::try_from(v).map_err(|_| Value::Int(v)),
                        other => Err(other),
                    }
                }

                fn into_value(self) -> Value {
                    Value::Int(self as i64)
                }
            }
        )+
    };
}

host_value_int!(i32, i64, u32);

impl HostValue for f32 {
    fn kind() -> ValueKind {
        ValueKind::Float
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Float(v) => Ok(v as f32),
            other => Err(other),
        }
    }

    fn into_value(self) -> Value {
        Value::Float(self as f64)
    }
}

impl HostValue for f64 {
    fn kind() -> ValueKind {
        ValueKind::Float
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Float(v) => Ok(v),
            other => Err(other),
        }
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl HostValue for String {
    fn kind() -> ValueKind {
        ValueKind::Str
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Str(v) => Ok(v),
            other => Err(other),
        }
    }

    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl HostValue for ObjectRef {
    fn kind() -> ValueKind {
        ValueKind::Ref
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Ref(v) => Ok(v),
            other => Err(other),
        }
    }

    fn into_value(self) -> Value {
        Value::Ref(self)
    }
}

impl<T: HostValue> HostValue for Option<T> {
    fn kind() -> ValueKind {
        T::kind()
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: HostValue> HostValue for Vec<T> {
    fn kind() -> ValueKind {
        ValueKind::List
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::List(items) => {
                let len = items.len();
                let converted: Vec<T> = items
                    .into_iter()
                    .map(T::from_value)
                    .collect::<Result<_, _>>()
                    .map_err(|_| Value::List(Vec::with_capacity(len)))?;
                Ok(converted)
            }
            other => Err(other),
        }
    }

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(HostValue::into_value).collect())
    }
}

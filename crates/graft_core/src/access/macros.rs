/// Implement `HostObject`, `HostValue`, `Target` and `TargetMut` for a type
/// described by a lazily built `HostType` static.
///
/// The type must be `Clone + PartialEq + Debug + 'static`.
///
/// # Example
/// ```ignore
/// static POSITION_TYPE: Lazy<HostType> = Lazy::new(|| {
///     HostType::builder::<Position>("Position")
///         .field("x", Visibility::Private, |p: &Position| p.x, |p, v| p.x = v)
///         .build()
/// });
///
/// host_object!(Position => POSITION_TYPE);
/// ```
#[macro_export]
macro_rules! host_object {
    ($ty:ty => $host_type:path) => {
        impl $crate::access::HostObject for $ty {
            fn host_type(&self) -> &'static $crate::access::HostType {
                &*$host_type
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any> {
                self
            }

            fn clone_object(&self) -> Box<dyn $crate::access::HostObject> {
                Box::new(self.clone())
            }

            fn object_eq(&self, other: &dyn $crate::access::HostObject) -> bool {
                other
                    .as_any()
                    .downcast_ref::<$ty>()
                    .map_or(false, |other| self == other)
            }
        }

        impl $crate::access::HostValue for $ty {
            fn kind() -> $crate::access::ValueKind {
                $crate::access::ValueKind::Object($host_type.name())
            }

            fn from_value(
                value: $crate::access::Value,
            ) -> ::std::result::Result<Self, $crate::access::Value> {
                match value {
                    $crate::access::Value::Object(object) if object.as_any().is::<$ty>() => object
                        .into_any()
                        .downcast::<$ty>()
                        .map(|boxed| *boxed)
                        .map_err(|_| $crate::access::Value::Null),
                    other => Err(other),
                }
            }

            fn into_value(self) -> $crate::access::Value {
                $crate::access::Value::Object(Box::new(self))
            }
        }

        impl $crate::access::Target for $ty {
            fn resolve(&self) -> Option<&dyn $crate::access::HostObject> {
                Some(self)
            }
        }

        impl $crate::access::TargetMut for $ty {
            fn resolve_mut(&mut self) -> Option<&mut dyn $crate::access::HostObject> {
                Some(self)
            }
        }
    };
}

//! Type references used by declarations.
//!
//! A declaration never names a schema type directly. It carries a [`TypeFn`]
//! that produces a [`TypeValue`] when invoked, so types can reference each
//! other before they are declared.

mod scalars;
mod type_ref;

use std::fmt;
use std::sync::Arc;

use async_graphql::Value;

use crate::metadata::{EnumId, TargetId, UnionId};

pub use scalars::{DateScalarMode, ScalarDefinition, ScalarType, ScalarsMap};
pub use type_ref::{named_type_name, wrap_with_type_options};

/// The value a type function produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeValue {
    /// Built-in or custom scalar.
    Scalar(ScalarType),
    /// Declared object, input, args or interface class.
    Class(TargetId),
    /// Registered enum.
    Enum(EnumId),
    /// Registered union.
    Union(UnionId),
}

impl From<ScalarType> for TypeValue {
    fn from(scalar: ScalarType) -> Self {
        Self::Scalar(scalar)
    }
}

impl From<TargetId> for TypeValue {
    fn from(target: TargetId) -> Self {
        Self::Class(target)
    }
}

impl From<EnumId> for TypeValue {
    fn from(id: EnumId) -> Self {
        Self::Enum(id)
    }
}

impl From<UnionId> for TypeValue {
    fn from(id: UnionId) -> Self {
        Self::Union(id)
    }
}

/// Deferred producer of a [`TypeValue`].
#[derive(Clone)]
pub struct TypeFn(Arc<dyn Fn() -> TypeValue + Send + Sync>);

impl TypeFn {
    /// Wraps a type-producing closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> TypeValue + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Returns a type function always producing the same value.
    pub fn of(value: impl Into<TypeValue>) -> Self {
        let value = value.into();
        Self::new(move || value.clone())
    }

    /// Invokes the function.
    pub fn get(&self) -> TypeValue {
        (self.0)()
    }
}

impl fmt::Debug for TypeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeFn(..)")
    }
}

/// Deferred producer of the object type a resolver class targets.
#[derive(Clone)]
pub struct ObjectTypeFn(Arc<dyn Fn() -> TargetId + Send + Sync>);

impl ObjectTypeFn {
    /// Wraps an object-type-producing closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> TargetId + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Returns a function always producing `target`.
    pub fn of(target: TargetId) -> Self {
        Self::new(move || target)
    }

    /// Invokes the function.
    pub fn get(&self) -> TargetId {
        (self.0)()
    }
}

impl fmt::Debug for ObjectTypeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ObjectTypeFn(..)")
    }
}

/// Nullability of a type and of its list items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nullable {
    /// Non-null type, non-null items.
    #[default]
    No,
    /// Nullable type, non-null items.
    Yes,
    /// Non-null list of nullable items.
    Items,
    /// Nullable list of nullable items.
    ItemsAndList,
}

impl Nullable {
    /// Returns whether the outermost type may be null.
    pub fn is_outer_nullable(self) -> bool {
        matches!(self, Self::Yes | Self::ItemsAndList)
    }

    /// Returns whether list items may be null.
    pub fn are_items_nullable(self) -> bool {
        matches!(self, Self::Items | Self::ItemsAndList)
    }
}

/// Modifiers applied on top of a named type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeOptions {
    /// Number of list dimensions wrapping the named type.
    pub array_depth: usize,
    /// Nullability of the type and of its items.
    pub nullable: Nullable,
    /// Declared default value (inputs and arguments only).
    pub default_value: Option<Value>,
}

impl TypeOptions {
    /// Plain non-null, non-list options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps the type in one list dimension.
    #[must_use]
    pub fn list(mut self) -> Self {
        self.array_depth += 1;
        self
    }

    /// Sets nullability.
    #[must_use]
    pub fn nullable(mut self, nullable: Nullable) -> Self {
        self.nullable = nullable;
        self
    }

    /// Sets the declared default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Returns whether the type is a list.
    pub fn is_list(&self) -> bool {
        self.array_depth > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_fn_is_lazy() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let type_fn = TypeFn::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            TypeValue::Scalar(ScalarType::String)
        });

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(type_fn.get(), TypeValue::Scalar(ScalarType::String));
        assert_eq!(type_fn.get(), TypeValue::Scalar(ScalarType::String));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_type_options_builder() {
        let options = TypeOptions::new()
            .list()
            .nullable(Nullable::Items)
            .default_value(10);
        assert!(options.is_list());
        assert_eq!(options.array_depth, 1);
        assert!(options.nullable.are_items_nullable());
        assert!(!options.nullable.is_outer_nullable());
        assert_eq!(options.default_value, Some(Value::from(10)));
    }
}

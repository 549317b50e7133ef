//! Request-time resolution of handlers and fields.
//!
//! This module provides the values exchanged with user handlers and the
//! machinery binding them to engine fields:
//! - `middleware`: interceptor trait and continuation
//! - `auth`: role checks run in front of guarded members
//! - `container`: resolver class instantiation
//! - `convert`: mapping handler results onto engine field values
//! - `create`: per-field runtime assembled during schema generation

pub mod auth;
pub mod container;
pub mod middleware;

mod convert;
mod create;

pub use auth::{AuthChecker, AuthMode, Role};
pub use container::{DefaultContainer, ResolverContainer};
pub use middleware::{Middleware, Next};

pub(crate) use convert::{AbstractKind, AbstractTypeResolver, EnumMapping, OutputKind};
pub(crate) use create::{
    ArgConversion, Endpoint, FieldRuntime, PreparedParam, ResolverSettings, arguments,
};

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_graphql::indexmap::IndexMap;
use async_graphql::{Name, Value};
use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::metadata::TargetId;

/// Result returned by handlers and middlewares.
pub type HandlerResult = async_graphql::Result<ResolvedValue>;

/// Value produced by a handler, middleware or default field resolution.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResolvedValue {
    #[default]
    Null,
    /// Plain engine value (scalars, enum internal values or structural objects).
    Value(Value),
    /// Instance of a declared class.
    Instance(Instance),
    List(Vec<ResolvedValue>),
}

impl ResolvedValue {
    /// Collects values into a list.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ResolvedValue>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null | Self::Value(Value::Null))
    }

    /// Reads a property of an object value, `Null` when absent.
    pub fn property(&self, name: &str) -> ResolvedValue {
        match self {
            Self::Instance(instance) => instance.get(name).cloned().unwrap_or_default(),
            Self::Value(Value::Object(map)) => map
                .get(name)
                .cloned()
                .map(ResolvedValue::Value)
                .unwrap_or_default(),
            _ => Self::Null,
        }
    }

    /// Returns the class of an instance value.
    pub fn target(&self) -> Option<TargetId> {
        match self {
            Self::Instance(instance) => Some(instance.target),
            _ => None,
        }
    }

    /// Flattens the value into a plain engine value, dropping class identities.
    pub fn into_value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Value(value) => value,
            Self::Instance(instance) => Value::Object(
                instance
                    .fields
                    .into_iter()
                    .map(|(name, value)| (Name::new(name), value.into_value()))
                    .collect(),
            ),
            Self::List(items) => Value::List(items.into_iter().map(Self::into_value).collect()),
        }
    }

    /// Converts a JSON document into a plain value.
    pub fn from_json(json: serde_json::Value) -> Self {
        // Every JSON document has a GraphQL counterpart.
        Self::Value(Value::from_json(json).unwrap_or(Value::Null))
    }
}

impl From<Value> for ResolvedValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Instance> for ResolvedValue {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl From<&str> for ResolvedValue {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<String> for ResolvedValue {
    fn from(value: String) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i32> for ResolvedValue {
    fn from(value: i32) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i64> for ResolvedValue {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<f64> for ResolvedValue {
    fn from(value: f64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<bool> for ResolvedValue {
    fn from(value: bool) -> Self {
        Self::Value(Value::from(value))
    }
}

impl<T: Into<ResolvedValue>> From<Option<T>> for ResolvedValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// Object data tagged with the class it is an instance of.
///
/// Union and interface fields inspect the class to pick the concrete type.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    target: TargetId,
    fields: IndexMap<String, ResolvedValue>,
}

impl Instance {
    pub fn new(target: TargetId) -> Self {
        Self {
            target,
            fields: IndexMap::new(),
        }
    }

    /// Sets a property, returning the instance.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ResolvedValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ResolvedValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedValue> {
        self.fields.get(name)
    }

    pub fn target(&self) -> TargetId {
        self.target
    }
}

/// Per-request data supplied by the caller.
///
/// Attach it to an engine request with `Request::data(RequestContext::new(..))`;
/// handlers, middlewares and auth checkers read it back with [`RequestContext::get`].
#[derive(Clone)]
pub struct RequestContext(Arc<dyn Any + Send + Sync>);

impl RequestContext {
    pub fn new<T: Any + Send + Sync>(data: T) -> Self {
        Self(Arc::new(data))
    }

    /// Returns the context data if it has type `T`.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestContext(..)")
    }
}

/// Static description of the field being resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveInfo {
    /// Schema name of the field.
    pub field_name: String,
    /// Name of the type owning the field.
    pub parent_type: String,
    /// Rendered return type, e.g. `[Book!]!`.
    pub return_type: String,
}

/// Everything known about a single field invocation.
#[derive(Debug, Clone)]
pub struct ResolverData {
    /// Parent value, or the subscription payload for subscription handlers.
    pub root: ResolvedValue,
    /// Arguments with enum values already mapped to their internal values.
    pub args: IndexMap<Name, Value>,
    pub context: Option<RequestContext>,
    pub info: ResolveInfo,
}

impl ResolverData {
    /// Returns an argument by schema name.
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }
}

/// Value injected for one handler parameter, in declaration order.
#[derive(Debug, Clone)]
pub enum ParamValue {
    /// Single argument.
    Arg(Value),
    /// Whole arguments object.
    Args(Value),
    Context(Option<RequestContext>),
    Info(ResolveInfo),
    Root(ResolvedValue),
}

impl ParamValue {
    /// Returns the plain value of an `Arg` or `Args` parameter.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Arg(value) | Self::Args(value) => Some(value),
            _ => None,
        }
    }
}

/// Arguments of a handler invocation.
pub struct HandlerCall {
    /// Resolver class instance; `None` for internal field resolvers, which run
    /// against `data.root`.
    pub instance: Option<Arc<dyn Any + Send + Sync>>,
    pub data: ResolverData,
    pub params: Vec<ParamValue>,
}

impl HandlerCall {
    /// Downcasts the resolver class instance.
    pub fn instance<T: Any>(&self) -> Option<&T> {
        self.instance.as_ref().and_then(|instance| instance.downcast_ref::<T>())
    }

    /// Returns the plain value of the parameter at `index`.
    pub fn param(&self, index: usize) -> Option<&Value> {
        self.params.get(index).and_then(ParamValue::as_value)
    }
}

type BoxedHandler = Arc<dyn Fn(HandlerCall) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Function invoked for a query, mutation, subscription or field resolver.
#[derive(Clone)]
pub struct HandlerFn(BoxedHandler);

impl HandlerFn {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(HandlerCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self(Arc::new(move |call| Box::pin(f(call))))
    }

    pub fn call(&self, call: HandlerCall) -> BoxFuture<'static, HandlerResult> {
        (self.0)(call)
    }
}

impl fmt::Debug for HandlerFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HandlerFn(..)")
    }
}

/// Shorthand for [`HandlerFn::new`].
pub fn handler<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(HandlerCall) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    HandlerFn::new(f)
}

/// Hook validating input objects before they reach a handler.
#[async_trait]
pub trait InputValidator: Send + Sync {
    /// Validates `value`, an instance of the input or args type `type_name`.
    async fn validate(&self, type_name: &str, value: &Value) -> async_graphql::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ClassTable;

    #[test]
    fn test_property_lookup() {
        let mut classes = ClassTable::new();
        let book = classes.declare("Book", None);
        let instance = ResolvedValue::from(Instance::new(book).with("title", "Dune"));
        assert_eq!(instance.property("title"), ResolvedValue::from("Dune"));
        assert!(instance.property("author").is_null());
        assert_eq!(instance.target(), Some(book));

        let structural = ResolvedValue::from_json(serde_json::json!({ "title": "Emma" }));
        assert_eq!(structural.property("title"), ResolvedValue::from("Emma"));
        assert_eq!(structural.target(), None);
    }

    #[test]
    fn test_into_value_flattens_instances() {
        let mut classes = ClassTable::new();
        let book = classes.declare("Book", None);
        let value = ResolvedValue::list([Instance::new(book).with("pages", 320)]).into_value();
        assert_eq!(
            value,
            Value::List(vec![Value::Object(
                [(Name::new("pages"), Value::from(320))].into_iter().collect()
            )])
        );
    }

    #[test]
    fn test_request_context_downcast() {
        let context = RequestContext::new(String::from("admin"));
        assert_eq!(context.get::<String>().map(String::as_str), Some("admin"));
        assert!(context.get::<u32>().is_none());
    }
}

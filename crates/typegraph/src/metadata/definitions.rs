//! Metadata records collected from declarations.
//!
//! Records are created once per declaration. The fields marked as linked are
//! filled in by [`MetadataStorage::build`](super::MetadataStorage::build).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use async_graphql::Value;
use indexmap::IndexMap;

use super::classes::{EnumId, TargetId, UnionId};
use crate::resolvers::{HandlerFn, Middleware, Role};
use crate::subscriptions::{FilterFn, Topics};
use crate::types::{ObjectTypeFn, TypeFn, TypeOptions};

/// Record owned by a declared class.
pub trait Owned {
    fn target(&self) -> TargetId;
}

/// Record owned by a member (field or method) of a declared class.
pub trait Member: Owned {
    fn member_name(&self) -> &str;
}

macro_rules! owned {
    ($ty:ty) => {
        impl Owned for $ty {
            fn target(&self) -> TargetId {
                self.target
            }
        }
    };
    ($ty:ty, $member:ident) => {
        owned!($ty);

        impl Member for $ty {
            fn member_name(&self) -> &str {
                &self.$member
            }
        }
    };
}

/// One field of an object, input, args or interface class.
#[derive(Debug, Clone)]
pub struct FieldMetadata {
    pub target: TargetId,
    /// Declared property name.
    pub name: String,
    /// Name exposed in the schema.
    pub schema_name: String,
    pub get_type: TypeFn,
    pub type_options: TypeOptions,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub complexity: Option<usize>,
    /// Linked: required roles, `None` when unguarded.
    pub roles: Option<Vec<Role>>,
    /// Linked: arguments of a field backed by an external resolver.
    pub params: Vec<ParamMetadata>,
    /// Linked: flattened middleware chain.
    pub middlewares: Vec<Arc<dyn Middleware>>,
}

impl FieldMetadata {
    pub fn new(target: TargetId, name: impl Into<String>, get_type: TypeFn) -> Self {
        let name = name.into();
        Self {
            target,
            schema_name: name.clone(),
            name,
            get_type,
            type_options: TypeOptions::default(),
            description: None,
            deprecation_reason: None,
            complexity: None,
            roles: None,
            params: Vec::new(),
            middlewares: Vec::new(),
        }
    }

    #[must_use]
    pub fn schema_name(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = schema_name.into();
        self
    }

    #[must_use]
    pub fn options(mut self, options: TypeOptions) -> Self {
        self.type_options = options;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecation_reason(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn complexity(mut self, complexity: usize) -> Self {
        self.complexity = Some(complexity);
        self
    }
}

owned!(FieldMetadata, name);

/// Shared shape of queries, mutations, subscriptions and field resolvers.
#[derive(Debug, Clone)]
pub struct ResolverMetadata {
    /// Declaring class.
    pub target: TargetId,
    pub method_name: String,
    pub schema_name: String,
    /// Explicit return type. Always present for root handlers.
    pub get_return_type: Option<TypeFn>,
    pub return_type_options: Option<TypeOptions>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub complexity: Option<usize>,
    pub handler: HandlerFn,
    /// Linked: the resolver class declaring this handler.
    pub resolver_class: Option<ResolverClassMetadata>,
    /// Linked: required roles, `None` when unguarded.
    pub roles: Option<Vec<Role>>,
    /// Linked: parameters in declaration order.
    pub params: Vec<ParamMetadata>,
    /// Linked: flattened middleware chain.
    pub middlewares: Vec<Arc<dyn Middleware>>,
}

impl ResolverMetadata {
    /// Creates a root handler (query, mutation or subscription body).
    pub fn new(
        target: TargetId,
        method_name: impl Into<String>,
        get_return_type: TypeFn,
        handler: HandlerFn,
    ) -> Self {
        let mut metadata = Self::untyped(target, method_name, handler);
        metadata.get_return_type = Some(get_return_type);
        metadata.return_type_options = Some(TypeOptions::default());
        metadata
    }

    fn untyped(target: TargetId, method_name: impl Into<String>, handler: HandlerFn) -> Self {
        let method_name = method_name.into();
        Self {
            target,
            schema_name: method_name.clone(),
            method_name,
            get_return_type: None,
            return_type_options: None,
            description: None,
            deprecation_reason: None,
            complexity: None,
            handler,
            resolver_class: None,
            roles: None,
            params: Vec::new(),
            middlewares: Vec::new(),
        }
    }

    #[must_use]
    pub fn schema_name(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = schema_name.into();
        self
    }

    #[must_use]
    pub fn options(mut self, options: TypeOptions) -> Self {
        self.return_type_options = Some(options);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecation_reason(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn complexity(mut self, complexity: usize) -> Self {
        self.complexity = Some(complexity);
        self
    }

    /// Returns whether the owning resolver class is abstract.
    pub fn is_abstract(&self) -> bool {
        self.resolver_class
            .as_ref()
            .is_some_and(|class| class.is_abstract)
    }
}

owned!(ResolverMetadata, method_name);

/// Where a field resolver method lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldResolverKind {
    /// Method of the object type itself.
    Internal,
    /// Method of a resolver class targeting another object type.
    External,
}

/// Method producing the value of an object type field.
#[derive(Debug, Clone)]
pub struct FieldResolverMetadata {
    pub base: ResolverMetadata,
    pub kind: FieldResolverKind,
    /// Linked: the object type whose field this resolves.
    pub get_object_type: Option<ObjectTypeFn>,
}

impl FieldResolverMetadata {
    /// Field resolver declared on the object type class itself.
    pub fn internal(target: TargetId, method_name: impl Into<String>, handler: HandlerFn) -> Self {
        Self {
            base: ResolverMetadata::untyped(target, method_name, handler),
            kind: FieldResolverKind::Internal,
            get_object_type: None,
        }
    }

    /// Field resolver declared on resolver class `target`.
    pub fn external(target: TargetId, method_name: impl Into<String>, handler: HandlerFn) -> Self {
        Self {
            base: ResolverMetadata::untyped(target, method_name, handler),
            kind: FieldResolverKind::External,
            get_object_type: None,
        }
    }

    #[must_use]
    pub fn with_return_type(mut self, get_type: TypeFn) -> Self {
        self.base.get_return_type = Some(get_type);
        self
    }

    #[must_use]
    pub fn with_return_type_options(mut self, options: TypeOptions) -> Self {
        self.base.return_type_options = Some(options);
        self
    }

    #[must_use]
    pub fn schema_name(mut self, schema_name: impl Into<String>) -> Self {
        self.base.schema_name = schema_name.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.base.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecation_reason(mut self, reason: impl Into<String>) -> Self {
        self.base.deprecation_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn complexity(mut self, complexity: usize) -> Self {
        self.base.complexity = Some(complexity);
        self
    }
}

impl Owned for FieldResolverMetadata {
    fn target(&self) -> TargetId {
        self.base.target
    }
}

impl Member for FieldResolverMetadata {
    fn member_name(&self) -> &str {
        &self.base.method_name
    }
}

/// Subscription handler with its topics and optional filter.
#[derive(Debug, Clone)]
pub struct SubscriptionResolverMetadata {
    pub base: ResolverMetadata,
    pub topics: Topics,
    pub filter: Option<FilterFn>,
}

impl SubscriptionResolverMetadata {
    pub fn new(base: ResolverMetadata, topics: Topics) -> Self {
        Self {
            base,
            topics,
            filter: None,
        }
    }

    /// Gates delivery of each payload.
    #[must_use]
    pub fn filter(mut self, filter: FilterFn) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl Owned for SubscriptionResolverMetadata {
    fn target(&self) -> TargetId {
        self.base.target
    }
}

impl Member for SubscriptionResolverMetadata {
    fn member_name(&self) -> &str {
        &self.base.method_name
    }
}

type InstanceFactory = Arc<dyn Fn() -> Arc<dyn Any + Send + Sync> + Send + Sync>;

/// Class marked as a resolver container.
#[derive(Clone)]
pub struct ResolverClassMetadata {
    pub target: TargetId,
    /// Object type targeted by external field resolvers, if any.
    pub get_object_type: Option<ObjectTypeFn>,
    /// Abstract classes emit no schema members of their own; subclasses
    /// inherit their handlers.
    pub is_abstract: bool,
    factory: Option<InstanceFactory>,
}

impl ResolverClassMetadata {
    pub fn new(target: TargetId) -> Self {
        Self {
            target,
            get_object_type: None,
            is_abstract: false,
            factory: None,
        }
    }

    #[must_use]
    pub fn object_type(mut self, get_object_type: ObjectTypeFn) -> Self {
        self.get_object_type = Some(get_object_type);
        self
    }

    #[must_use]
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Sets the function creating the instance handlers run against.
    #[must_use]
    pub fn factory<T, F>(mut self, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(move || Arc::new(factory()) as Arc<dyn Any + Send + Sync>));
        self
    }

    /// Creates a new instance, a unit value when no factory is registered.
    pub fn instantiate(&self) -> Arc<dyn Any + Send + Sync> {
        match &self.factory {
            Some(factory) => factory(),
            None => Arc::new(()),
        }
    }
}

impl fmt::Debug for ResolverClassMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverClassMetadata")
            .field("target", &self.target)
            .field("get_object_type", &self.get_object_type)
            .field("is_abstract", &self.is_abstract)
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}

owned!(ResolverClassMetadata);

/// What a handler parameter receives.
#[derive(Debug, Clone)]
pub enum ParamKind {
    /// A single argument.
    Arg {
        name: String,
        get_type: TypeFn,
        type_options: TypeOptions,
        description: Option<String>,
        /// Run the input validator on the value.
        validate: bool,
    },
    /// Every field of an args class, as one object.
    Args { get_type: TypeFn, validate: bool },
    /// The request context.
    Context,
    /// Static info about the field being resolved.
    Info,
    /// The parent value, or one of its properties.
    Root { property: Option<String> },
}

/// One handler parameter.
#[derive(Debug, Clone)]
pub struct ParamMetadata {
    pub target: TargetId,
    pub method_name: String,
    /// Position in the handler signature.
    pub index: usize,
    pub kind: ParamKind,
}

impl ParamMetadata {
    pub fn new(target: TargetId, method_name: impl Into<String>, index: usize, kind: ParamKind) -> Self {
        Self {
            target,
            method_name: method_name.into(),
            index,
            kind,
        }
    }

    /// Single argument parameter with validation enabled.
    pub fn arg(
        target: TargetId,
        method_name: impl Into<String>,
        index: usize,
        name: impl Into<String>,
        get_type: TypeFn,
        type_options: TypeOptions,
    ) -> Self {
        Self::new(
            target,
            method_name,
            index,
            ParamKind::Arg {
                name: name.into(),
                get_type,
                type_options,
                description: None,
                validate: true,
            },
        )
    }

    /// Whole-arguments parameter with validation enabled.
    pub fn args(target: TargetId, method_name: impl Into<String>, index: usize, get_type: TypeFn) -> Self {
        Self::new(
            target,
            method_name,
            index,
            ParamKind::Args {
                get_type,
                validate: true,
            },
        )
    }
}

owned!(ParamMetadata, method_name);

/// Roles required to resolve a member.
#[derive(Debug, Clone)]
pub struct AuthorizedMetadata {
    pub target: TargetId,
    pub field_name: String,
    pub roles: Vec<Role>,
}

impl AuthorizedMetadata {
    pub fn new<I, R>(target: TargetId, field_name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        Self {
            target,
            field_name: field_name.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

owned!(AuthorizedMetadata, field_name);

/// Interceptors attached to a member.
#[derive(Debug, Clone)]
pub struct MiddlewareMetadata {
    pub target: TargetId,
    pub field_name: String,
    pub middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareMetadata {
    pub fn new(
        target: TargetId,
        field_name: impl Into<String>,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> Self {
        Self {
            target,
            field_name: field_name.into(),
            middlewares,
        }
    }
}

owned!(MiddlewareMetadata, field_name);

type DefaultsFactory = Arc<dyn Fn() -> IndexMap<String, Value> + Send + Sync>;

/// Object, input, args or interface class.
#[derive(Clone)]
pub struct ClassMetadata {
    pub target: TargetId,
    /// Schema type name.
    pub name: String,
    pub description: Option<String>,
    /// Implemented interface classes (object and interface types).
    pub interfaces: Vec<TargetId>,
    /// Linked: fields owned by the class.
    pub fields: Vec<FieldMetadata>,
    instance_defaults: Option<DefaultsFactory>,
}

impl ClassMetadata {
    pub fn new(target: TargetId, name: impl Into<String>) -> Self {
        Self {
            target,
            name: name.into(),
            description: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            instance_defaults: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: TargetId) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Sets the property values a freshly created instance carries.
    ///
    /// Input and args types reconcile these with declared field defaults.
    #[must_use]
    pub fn instance_defaults<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> IndexMap<String, Value> + Send + Sync + 'static,
    {
        self.instance_defaults = Some(Arc::new(factory));
        self
    }

    /// Creates a transient instance and returns its property values.
    pub fn create_instance_defaults(&self) -> IndexMap<String, Value> {
        self.instance_defaults
            .as_ref()
            .map(|factory| factory())
            .unwrap_or_default()
    }

    pub fn field(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldMetadata> {
        self.fields.iter_mut().find(|field| field.name == name)
    }
}

impl fmt::Debug for ClassMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMetadata")
            .field("target", &self.target)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("interfaces", &self.interfaces)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

owned!(ClassMetadata);

/// Registered enum; `values` maps item names to internal values.
#[derive(Debug, Clone)]
pub struct EnumMetadata {
    pub id: EnumId,
    pub name: String,
    pub description: Option<String>,
    pub values: IndexMap<String, Value>,
}

/// Registered union of object types.
#[derive(Debug, Clone)]
pub struct UnionMetadata {
    pub id: UnionId,
    pub name: String,
    pub description: Option<String>,
    pub types: Vec<TargetId>,
}

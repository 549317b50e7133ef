//! # typegraph
//!
//! Metadata registry and GraphQL schema synthesis for declared types.
//!
//! Object, input, args and interface types, enums, unions and resolver
//! classes are declared into a [`MetadataStorage`] in any order. Building the
//! registry links fields to resolvers, roles, middlewares and inherited
//! handlers; the schema generator then turns the linked metadata into an
//! executable `async_graphql::dynamic::Schema`.
//!
//! ## Overview
//!
//! ```ignore
//! let mut storage = MetadataStorage::new();
//! let book = storage.declare_class("Book");
//! storage.collect_object_metadata(ClassMetadata::new(book, "Book"));
//! storage.collect_class_field(FieldMetadata::new(book, "title", TypeFn::of(ScalarType::String)));
//!
//! let resolver = storage.declare_class("BookResolver");
//! storage.collect_resolver_class(ResolverClassMetadata::new(resolver));
//! storage.collect_query_handler(
//!     ResolverMetadata::new(resolver, "books", TypeFn::of(book), handler(list_books))
//!         .options(TypeOptions::new().list()),
//! );
//!
//! let schema = build_schema(&mut storage, BuildSchemaOptions::new([resolver])).await?;
//! ```
//!
//! ## Configuration
//!
//! ```toml
//! [schema]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! ```
//!
//! ## Modules
//!
//! - [`metadata`] - Declaration records, storages and the registry
//! - [`types`] - Type functions, modifiers and scalars
//! - [`resolvers`] - Handler values, middlewares, auth and containers
//! - [`subscriptions`] - Topics, filters and the pub/sub engine
//! - [`schema`] - Schema generation and lazy loading
//! - [`config`] - Configuration options
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod metadata;
pub mod resolvers;
pub mod schema;
pub mod subscriptions;
pub mod types;

// Re-export main types
pub use config::SchemaConfig;
pub use error::{Result, SchemaError};
pub use metadata::{
    AuthorizedMetadata, ClassMetadata, ClassTable, EnumId, EnumMetadata, FieldMetadata,
    FieldResolverKind, FieldResolverMetadata, MetadataStorage, MiddlewareMetadata, ParamKind,
    ParamMetadata, ResolverClassMetadata, ResolverMetadata, SubscriptionResolverMetadata, TargetId,
    UnionId, UnionMetadata, default_metadata_storage,
};
pub use resolvers::{
    AuthChecker, AuthMode, HandlerCall, HandlerFn, HandlerResult, Instance, Middleware, Next,
    ParamValue, RequestContext, ResolveInfo, ResolvedValue, ResolverContainer, ResolverData, Role,
    handler,
};
pub use schema::{BuildSchemaOptions, LazySchema, build_schema, build_schema_sync};
pub use subscriptions::{PubSub, PubSubEngine, Topics};
pub use types::{
    DateScalarMode, Nullable, ObjectTypeFn, ScalarDefinition, ScalarType, TypeFn, TypeOptions,
    TypeValue,
};

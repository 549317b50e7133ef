//! GraphQL schema generation and lazy loading.
//!
//! This module turns a built metadata registry into an executable
//! `async_graphql::dynamic::Schema`.
//!
//! ## Components
//!
//! - [`build_schema`] / [`build_schema_sync`] - Build the registry and generate the schema
//! - [`BuildSchemaOptions`] - Resolvers, scalars, auth, pub/sub and limits of one build
//! - [`LazySchema`] - Thread-safe lazy schema holder with rebuild support
//!
//! ## Architecture
//!
//! The generation process:
//! 1. Type infos are registered: unions, enums, interfaces, objects, inputs
//! 2. Root types are assembled from query, mutation and subscription handlers
//! 3. Every registered type is built, resolving type references by name
//! 4. Used scalars are registered and limits applied
//! 5. The async builder optionally runs an introspection self-check

mod build_context;
mod builder;
mod default_value;
mod field_spec;
mod generator;
mod graphql_type_builder;
mod handler_args;
mod lazy;
mod type_builders;
mod types_info;

pub use build_context::{BuildContext, BuildSchemaOptions};
pub use builder::{build_schema, build_schema_sync};
pub use lazy::{LazySchema, SchemaState};

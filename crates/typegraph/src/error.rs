//! Error types for metadata building and schema generation.
//!
//! Almost every variant is a configuration error raised while the registry
//! is built or the schema is assembled. Request-time failures (abstract type
//! resolution, or a dynamic topic function returning no topics) surface
//! through the execution engine as field errors.

use async_graphql::ErrorExtensions;
use thiserror::Error;

/// Errors raised while building metadata or generating the schema.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    /// An external field resolver targets a field its object type does not
    /// declare, and carries no explicit return type to synthesize it from.
    #[error(
        "Unable to infer GraphQL type from resolver '{class_name}.{method_name}'. \
         Provide an explicit type and type options for the field resolver."
    )]
    NoExplicitType {
        class_name: String,
        method_name: String,
    },

    /// An input field declares a default that differs from the value set by
    /// the type's instance factory.
    #[error(
        "The '{field_name}' field of '{type_name}' has conflicting default values. \
         Default value from the declaration: {declared}, \
         default value from the instance factory: {initializer}."
    )]
    ConflictingDefaultValues {
        type_name: String,
        field_name: String,
        declared: String,
        initializer: String,
    },

    /// A subscription resolved to an empty topic list.
    #[error(
        "Subscription '{class_name}.{method_name}' doesn't provide any topics to subscribe to"
    )]
    MissingSubscriptionTopics {
        class_name: String,
        method_name: String,
    },

    /// A value returned for a union field matched none of the union members.
    #[error("Cannot resolve type for union '{union_name}'. The value matches none of its member types.")]
    UnionResolveType { union_name: String },

    /// A value returned for an interface field matched no implementing type.
    #[error("Cannot resolve concrete type for interface '{interface_name}'")]
    InterfaceResolveType { interface_name: String },

    /// A type reference could not be matched against any registered type.
    #[error("Cannot determine GraphQL {direction} type for '{owner}'")]
    UnresolvableType {
        owner: String,
        direction: TypeDirection,
    },

    /// A resolver class gave no object type and is not abstract.
    #[error("No provided object type for resolver class '{class_name}'")]
    MissingObjectType { class_name: String },

    /// A handler was collected for a class that was never marked as a resolver.
    #[error("'{class_name}.{method_name}' is declared on a class not registered as a resolver class")]
    UnknownResolverClass {
        class_name: String,
        method_name: String,
    },

    /// Roles were declared but no auth checker was supplied.
    #[error("An auth checker must be provided when fields or handlers declare required roles")]
    MissingAuthChecker,

    /// Schema build was requested with no resolver classes.
    #[error("Empty resolvers list supplied to the schema builder")]
    EmptyResolvers,

    /// Nullable list items were requested for a non-list type.
    #[error("Wrong nullable option set for '{owner}': item nullability requires a list type")]
    WrongNullableListOption { owner: String },

    /// Two schema types share the same name.
    #[error("Schema type name '{name}' is registered more than once")]
    DuplicateTypeName { name: String },

    /// `build()` was invoked twice without clearing the registry.
    #[error("Metadata registry has already been built; clear it before building again")]
    RegistryAlreadyBuilt,

    /// A lazily built schema is still being constructed.
    #[error("Schema is initializing, please retry")]
    SchemaInitializing,

    /// The produced schema failed its introspection self-check.
    #[error("Generating schema error: {0}")]
    GeneratingSchema(String),

    /// Configuration values are out of range.
    #[error("Invalid schema configuration: {0}")]
    InvalidConfig(String),

    /// The execution engine rejected the assembled schema.
    #[error("Execution engine rejected the schema: {0}")]
    Engine(String),
}

/// Direction of a type lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDirection {
    Input,
    Output,
}

impl std::fmt::Display for TypeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

impl SchemaError {
    /// Create a new NoExplicitType error
    pub fn no_explicit_type(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self::NoExplicitType {
            class_name: class_name.into(),
            method_name: method_name.into(),
        }
    }

    /// Create a new MissingSubscriptionTopics error
    pub fn missing_topics(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self::MissingSubscriptionTopics {
            class_name: class_name.into(),
            method_name: method_name.into(),
        }
    }

    /// Create a new UnresolvableType error for an input lookup
    pub fn unresolvable_input(owner: impl Into<String>) -> Self {
        Self::UnresolvableType {
            owner: owner.into(),
            direction: TypeDirection::Input,
        }
    }

    /// Create a new UnresolvableType error for an output lookup
    pub fn unresolvable_output(owner: impl Into<String>) -> Self {
        Self::UnresolvableType {
            owner: owner.into(),
            direction: TypeDirection::Output,
        }
    }

    /// Returns a stable error code for logs and error extensions.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoExplicitType { .. } => "NO_EXPLICIT_TYPE",
            Self::ConflictingDefaultValues { .. } => "CONFLICTING_DEFAULT_VALUES",
            Self::MissingSubscriptionTopics { .. } => "MISSING_SUBSCRIPTION_TOPICS",
            Self::UnionResolveType { .. } => "UNION_RESOLVE_TYPE",
            Self::InterfaceResolveType { .. } => "INTERFACE_RESOLVE_TYPE",
            Self::UnresolvableType { .. } => "UNRESOLVABLE_TYPE",
            Self::MissingObjectType { .. } => "MISSING_OBJECT_TYPE",
            Self::UnknownResolverClass { .. } => "UNKNOWN_RESOLVER_CLASS",
            Self::MissingAuthChecker => "MISSING_AUTH_CHECKER",
            Self::EmptyResolvers => "EMPTY_RESOLVERS",
            Self::WrongNullableListOption { .. } => "WRONG_NULLABLE_LIST_OPTION",
            Self::DuplicateTypeName { .. } => "DUPLICATE_TYPE_NAME",
            Self::RegistryAlreadyBuilt => "REGISTRY_ALREADY_BUILT",
            Self::SchemaInitializing => "SCHEMA_INITIALIZING",
            Self::GeneratingSchema(_) => "GENERATING_SCHEMA",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Engine(_) => "ENGINE_ERROR",
        }
    }

    /// Returns whether the error can only happen while serving a request.
    #[must_use]
    pub fn is_request_time(&self) -> bool {
        matches!(
            self,
            Self::UnionResolveType { .. } | Self::InterfaceResolveType { .. }
        )
    }

    /// Converts the error into an execution engine field error.
    #[must_use]
    pub fn into_graphql_error(self) -> async_graphql::Error {
        let code = self.error_code();
        async_graphql::Error::new(self.to_string())
            .extend_with(|_, ext| ext.set("code", code.to_string()))
    }
}

/// Result type for metadata and schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_culprit() {
        let err = SchemaError::no_explicit_type("ItemResolver", "price");
        let msg = err.to_string();
        assert!(msg.contains("ItemResolver"));
        assert!(msg.contains("price"));

        let err = SchemaError::ConflictingDefaultValues {
            type_name: "Filter".into(),
            field_name: "limit".into(),
            declared: "10".into(),
            initializer: "20".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Filter"));
        assert!(msg.contains("limit"));
        assert!(msg.contains("10"));
        assert!(msg.contains("20"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaError::EmptyResolvers.error_code(), "EMPTY_RESOLVERS");
        assert_eq!(
            SchemaError::unresolvable_input("limit").error_code(),
            "UNRESOLVABLE_TYPE"
        );
        assert_eq!(
            SchemaError::missing_topics("Sub", "onEvent").error_code(),
            "MISSING_SUBSCRIPTION_TOPICS"
        );
    }

    #[test]
    fn test_direction_display() {
        let err = SchemaError::unresolvable_output("books");
        assert_eq!(
            err.to_string(),
            "Cannot determine GraphQL output type for 'books'"
        );
    }

    #[test]
    fn test_request_time_classification() {
        assert!(
            SchemaError::UnionResolveType {
                union_name: "SearchResult".into()
            }
            .is_request_time()
        );
        assert!(!SchemaError::MissingAuthChecker.is_request_time());
    }
}

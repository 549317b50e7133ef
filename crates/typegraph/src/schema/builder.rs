//! Schema build entry points.

use async_graphql::dynamic::Schema;
use tracing::{debug, info};

use super::build_context::{BuildContext, BuildSchemaOptions};
use super::generator::SchemaGenerator;
use crate::error::{Result, SchemaError};
use crate::metadata::MetadataStorage;

/// Introspection query run by the self-check.
const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types { ...FullType }
    directives {
      name
      description
      locations
      args { ...InputValue }
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args { ...InputValue }
    type { ...TypeRef }
    isDeprecated
    deprecationReason
  }
  inputFields { ...InputValue }
  interfaces { ...TypeRef }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes { ...TypeRef }
}

fragment InputValue on __InputValue {
  name
  description
  type { ...TypeRef }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
          }
        }
      }
    }
  }
}
"#;

/// Builds the registry and generates its schema.
///
/// # Errors
///
/// Returns `EmptyResolvers` for an empty resolver list, `MissingAuthChecker`
/// when roles are declared without a checker, and any error raised while
/// building the registry or generating the schema.
pub fn build_schema_sync(storage: &mut MetadataStorage, options: BuildSchemaOptions) -> Result<Schema> {
    if options.resolvers.is_empty() {
        return Err(SchemaError::EmptyResolvers);
    }
    let context = BuildContext::create(options, storage)?;

    storage.build()?;
    debug!("Metadata registry built");

    let schema = SchemaGenerator::new(storage, &context).generate()?;
    info!("Schema generated");
    Ok(schema)
}

/// Builds the schema like [`build_schema_sync`], then runs an introspection
/// query against it when introspection and its check are enabled.
///
/// # Errors
///
/// Returns `GeneratingSchema` with the joined error messages when the
/// introspection query fails.
pub async fn build_schema(storage: &mut MetadataStorage, options: BuildSchemaOptions) -> Result<Schema> {
    let run_check = options.config.runs_introspection_check();
    let schema = build_schema_sync(storage, options)?;
    if run_check {
        check_introspection(&schema).await?;
    }
    Ok(schema)
}

async fn check_introspection(schema: &Schema) -> Result<()> {
    let response = schema.execute(INTROSPECTION_QUERY).await;
    if response.errors.is_empty() {
        debug!("Introspection check passed");
        return Ok(());
    }
    let messages: Vec<&str> = response
        .errors
        .iter()
        .map(|error| error.message.as_str())
        .collect();
    Err(SchemaError::GeneratingSchema(messages.join("\n")))
}

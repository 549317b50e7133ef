//! Reconciliation of declared defaults with instance defaults.

use async_graphql::Value;
use indexmap::IndexMap;

use crate::error::{Result, SchemaError};
use crate::types::TypeOptions;

/// Returns the default exposed for an input or args field.
///
/// The declared default wins over the value a fresh instance carries; both
/// being present with different values is an error.
pub(crate) fn resolve_default_value(
    instance_defaults: &IndexMap<String, Value>,
    options: &TypeOptions,
    field_name: &str,
    type_name: &str,
) -> Result<Option<Value>> {
    let initializer = instance_defaults.get(field_name);

    match (&options.default_value, initializer) {
        (Some(declared), Some(initializer)) if declared != initializer => {
            Err(SchemaError::ConflictingDefaultValues {
                type_name: type_name.to_string(),
                field_name: field_name.to_string(),
                declared: declared.to_string(),
                initializer: initializer.to_string(),
            })
        }
        (Some(declared), _) => Ok(Some(declared.clone())),
        (None, initializer) => Ok(initializer.cloned()),
    }
}

//! Applying [`TypeOptions`] to named engine types.

use async_graphql::dynamic::TypeRef;

use super::TypeOptions;
use crate::error::{Result, SchemaError};

/// Wraps a named type in the list and non-null modifiers described by `options`.
///
/// `owner` names the field, argument or handler being typed and is only used
/// for error reporting.
pub fn wrap_with_type_options(owner: &str, name: &str, options: &TypeOptions) -> Result<TypeRef> {
    let items_nullable = options.nullable.are_items_nullable();
    if items_nullable && !options.is_list() {
        return Err(SchemaError::WrongNullableListOption {
            owner: owner.to_string(),
        });
    }

    let mut type_ref = TypeRef::named(name.to_string());
    for _ in 0..options.array_depth {
        // Innermost items and nested list dimensions share the item nullability.
        if !items_nullable {
            type_ref = TypeRef::NonNull(Box::new(type_ref));
        }
        type_ref = TypeRef::List(Box::new(type_ref));
    }

    if !options.nullable.is_outer_nullable() {
        type_ref = TypeRef::NonNull(Box::new(type_ref));
    }
    Ok(type_ref)
}

/// Returns the innermost named type of a type reference.
pub fn named_type_name(type_ref: &TypeRef) -> &str {
    match type_ref {
        TypeRef::Named(name) => &**name,
        TypeRef::NonNull(inner) | TypeRef::List(inner) => named_type_name(inner),
    }
}

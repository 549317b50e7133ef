//! Resolution of declared type values into schema type references.

use std::cell::RefCell;
use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic::{Scalar, TypeRef};
use indexmap::IndexMap;
use tracing::trace;

use super::build_context::BuildContext;
use super::types_info::TypesInfo;
use crate::error::{Result, SchemaError, TypeDirection};
use crate::resolvers::{EnumMapping, OutputKind};
use crate::types::{ScalarType, TypeOptions, TypeValue, wrap_with_type_options};

/// Output type of a field or handler.
pub(crate) struct OutputType {
    pub type_ref: TypeRef,
    pub kind: OutputKind,
}

/// Input type of an argument or input field.
pub(crate) struct InputType {
    pub type_ref: TypeRef,
    pub enum_mapping: Option<Arc<EnumMapping>>,
    /// Name of the input class, when the type is one.
    pub input_class: Option<String>,
}

impl InputType {
    /// Renders a declared default the way the schema exposes it; enum
    /// internal values become item names.
    pub fn schema_default(&self, value: Value) -> Value {
        let Some(mapping) = &self.enum_mapping else {
            return value;
        };
        match value {
            Value::List(items) => Value::List(
                items
                    .into_iter()
                    .map(|item| self.schema_default(item))
                    .collect(),
            ),
            value => mapping.to_output(&value).unwrap_or(value),
        }
    }
}

/// Turns type values into type references, looking them up in the type infos.
///
/// Scalars outside the built-in set are recorded so only used ones are
/// registered.
pub(crate) struct GraphqlTypeBuilder<'a> {
    info: &'a TypesInfo<'a>,
    context: &'a BuildContext,
    used_scalars: RefCell<IndexMap<String, Scalar>>,
}

impl<'a> GraphqlTypeBuilder<'a> {
    pub fn new(info: &'a TypesInfo<'a>, context: &'a BuildContext) -> Self {
        Self {
            info,
            context,
            used_scalars: RefCell::new(IndexMap::new()),
        }
    }

    pub fn info(&self) -> &'a TypesInfo<'a> {
        self.info
    }

    pub fn output_type(&self, owner: &str, value: TypeValue, options: &TypeOptions) -> Result<OutputType> {
        let (name, kind) = match value {
            TypeValue::Scalar(scalar) => (
                self.scalar_name(owner, &scalar, TypeDirection::Output)?,
                OutputKind::Leaf,
            ),
            TypeValue::Class(target) => {
                if let Some(object) = self.info.find_object(target) {
                    (object.name.clone(), OutputKind::Object)
                } else if let Some(interface) = self.info.find_interface(target) {
                    (
                        interface.metadata.name.clone(),
                        OutputKind::Abstract(Arc::clone(&interface.resolver)),
                    )
                } else {
                    return Err(SchemaError::unresolvable_output(owner));
                }
            }
            TypeValue::Enum(id) => {
                let info = self
                    .info
                    .find_enum(id)
                    .ok_or_else(|| SchemaError::unresolvable_output(owner))?;
                (
                    info.metadata.name.clone(),
                    OutputKind::Enum(Arc::clone(&info.mapping)),
                )
            }
            TypeValue::Union(id) => {
                let info = self
                    .info
                    .find_union(id)
                    .ok_or_else(|| SchemaError::unresolvable_output(owner))?;
                (
                    info.metadata.name.clone(),
                    OutputKind::Abstract(Arc::clone(&info.resolver)),
                )
            }
        };

        let type_ref = wrap_with_type_options(owner, &name, options)?;
        trace!(owner, type_ref = %type_ref, "Resolved output type");
        Ok(OutputType { type_ref, kind })
    }

    pub fn input_type(&self, owner: &str, value: TypeValue, options: &TypeOptions) -> Result<InputType> {
        let (name, enum_mapping, input_class) = match value {
            TypeValue::Scalar(scalar) => (
                self.scalar_name(owner, &scalar, TypeDirection::Input)?,
                None,
                None,
            ),
            TypeValue::Class(target) => {
                let input = self
                    .info
                    .find_input(target)
                    .ok_or_else(|| SchemaError::unresolvable_input(owner))?;
                (input.name.clone(), None, Some(input.name.clone()))
            }
            TypeValue::Enum(id) => {
                let info = self
                    .info
                    .find_enum(id)
                    .ok_or_else(|| SchemaError::unresolvable_input(owner))?;
                (
                    info.metadata.name.clone(),
                    Some(Arc::clone(&info.mapping)),
                    None,
                )
            }
            TypeValue::Union(_) => return Err(SchemaError::unresolvable_input(owner)),
        };

        let type_ref = wrap_with_type_options(owner, &name, options)?;
        trace!(owner, type_ref = %type_ref, "Resolved input type");
        Ok(InputType {
            type_ref,
            enum_mapping,
            input_class,
        })
    }

    fn scalar_name(&self, owner: &str, scalar: &ScalarType, direction: TypeDirection) -> Result<String> {
        let name = match scalar {
            ScalarType::String => TypeRef::STRING,
            ScalarType::Int => TypeRef::INT,
            ScalarType::Float => TypeRef::FLOAT,
            ScalarType::Boolean => TypeRef::BOOLEAN,
            ScalarType::Id => TypeRef::ID,
            ScalarType::Date => {
                let mode = self.context.date_scalar_mode();
                self.used_scalars
                    .borrow_mut()
                    .entry(mode.scalar_name().to_string())
                    .or_insert_with(|| mode.to_scalar());
                mode.scalar_name()
            }
            ScalarType::Custom(name) => {
                let Some(definition) = self.context.scalars_map().get(name) else {
                    return Err(SchemaError::UnresolvableType {
                        owner: owner.to_string(),
                        direction,
                    });
                };
                self.used_scalars
                    .borrow_mut()
                    .entry(name.clone())
                    .or_insert_with(|| definition.to_scalar());
                name
            }
        };
        Ok(name.to_string())
    }

    /// Returns the non built-in scalars referenced so far.
    pub fn into_used_scalars(self) -> Vec<Scalar> {
        self.used_scalars.into_inner().into_values().collect()
    }
}

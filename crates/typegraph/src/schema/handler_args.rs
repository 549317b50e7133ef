//! Argument lists and invocation parameters of handlers.

use std::sync::Arc;

use async_graphql::Name;
use indexmap::IndexMap;
use tracing::trace;

use super::default_value::resolve_default_value;
use super::field_spec::{ArgSpec, merge_fields};
use super::graphql_type_builder::GraphqlTypeBuilder;
use crate::error::{Result, SchemaError};
use crate::metadata::{ClassMetadata, ClassTable, ParamKind, ParamMetadata, TargetSpecificStorage};
use crate::resolvers::{ArgConversion, EnumMapping, PreparedParam};
use crate::types::TypeValue;

/// Schema arguments of a handler plus what its invocation needs.
#[derive(Default)]
pub(crate) struct HandlerArgs {
    pub args: IndexMap<String, ArgSpec>,
    pub params: Vec<PreparedParam>,
    pub conversions: Vec<ArgConversion>,
}

pub(crate) struct HandlerArgsGenerator<'g, 'a> {
    pub types: &'g GraphqlTypeBuilder<'a>,
    pub args_types: &'a TargetSpecificStorage<ClassMetadata>,
    pub classes: &'a ClassTable,
}

impl HandlerArgsGenerator<'_, '_> {
    pub fn generate(&self, params: &[ParamMetadata]) -> Result<HandlerArgs> {
        let mut params: Vec<&ParamMetadata> = params.iter().collect();
        params.sort_by_key(|param| param.index);

        let mut args = IndexMap::new();
        let mut conversions: IndexMap<String, Arc<EnumMapping>> = IndexMap::new();
        let mut prepared = Vec::with_capacity(params.len());

        for param in params {
            let owner = format!("{}.{}", self.classes.name(param.target), param.method_name);
            let prepared_param = match &param.kind {
                ParamKind::Arg {
                    name,
                    get_type,
                    type_options,
                    description,
                    validate,
                } => {
                    let input = self.types.input_type(&owner, get_type.get(), type_options)?;
                    let default_value = type_options
                        .default_value
                        .clone()
                        .map(|value| input.schema_default(value));
                    set_conversion(&mut conversions, name, input.enum_mapping.clone());
                    let validate_as = input.input_class.clone().filter(|_| *validate);
                    merge_fields(
                        &mut args,
                        [(
                            name.clone(),
                            ArgSpec {
                                name: name.clone(),
                                type_ref: input.type_ref,
                                description: description.clone(),
                                default_value,
                            },
                        )],
                    );
                    PreparedParam::Arg {
                        name: name.clone(),
                        validate_as,
                    }
                }
                ParamKind::Args { get_type, validate } => {
                    let class = self.args_class(&owner, get_type.get())?;
                    self.expand_args_class(class, &mut args, &mut conversions)?;
                    PreparedParam::Args {
                        validate_as: validate.then(|| class.name.clone()),
                    }
                }
                ParamKind::Context => PreparedParam::Context,
                ParamKind::Info => PreparedParam::Info,
                ParamKind::Root { property } => PreparedParam::Root {
                    property: property.clone(),
                },
            };
            prepared.push(prepared_param);
        }

        Ok(HandlerArgs {
            args,
            params: prepared,
            conversions: conversions
                .into_iter()
                .map(|(name, mapping)| ArgConversion {
                    name: Name::new(name),
                    mapping,
                })
                .collect(),
        })
    }

    fn args_class(&self, owner: &str, value: TypeValue) -> Result<&ClassMetadata> {
        match value {
            TypeValue::Class(target) => self
                .args_types
                .find(target)
                .ok_or_else(|| SchemaError::unresolvable_input(owner)),
            _ => Err(SchemaError::unresolvable_input(owner)),
        }
    }

    /// Adds every field of an args class, ancestors first so the class's own
    /// fields are applied last.
    fn expand_args_class(
        &self,
        class: &ClassMetadata,
        args: &mut IndexMap<String, ArgSpec>,
        conversions: &mut IndexMap<String, Arc<EnumMapping>>,
    ) -> Result<()> {
        let mut chain: Vec<&ClassMetadata> = self
            .classes
            .ancestors(class.target)
            .filter_map(|ancestor| self.args_types.find(ancestor))
            .collect();
        chain.reverse();
        chain.push(class);

        for class in chain {
            self.map_arg_fields(class, args, conversions)?;
        }
        trace!(args_type = %class.name, args = args.len(), "Expanded args type");
        Ok(())
    }

    fn map_arg_fields(
        &self,
        class: &ClassMetadata,
        args: &mut IndexMap<String, ArgSpec>,
        conversions: &mut IndexMap<String, Arc<EnumMapping>>,
    ) -> Result<()> {
        let instance_defaults = class.create_instance_defaults();
        for field in &class.fields {
            let owner = format!("{}.{}", class.name, field.name);
            let input = self
                .types
                .input_type(&owner, field.get_type.get(), &field.type_options)?;
            let default_value =
                resolve_default_value(&instance_defaults, &field.type_options, &field.name, &class.name)?
                    .map(|value| input.schema_default(value));
            set_conversion(conversions, &field.schema_name, input.enum_mapping.clone());
            merge_fields(
                args,
                [(
                    field.schema_name.clone(),
                    ArgSpec {
                        name: field.schema_name.clone(),
                        type_ref: input.type_ref,
                        description: field.description.clone(),
                        default_value,
                    },
                )],
            );
        }
        Ok(())
    }
}

fn set_conversion(
    conversions: &mut IndexMap<String, Arc<EnumMapping>>,
    name: &str,
    mapping: Option<Arc<EnumMapping>>,
) {
    match mapping {
        Some(mapping) => {
            conversions.insert(name.to_string(), mapping);
        }
        None => {
            conversions.shift_remove(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{FieldMetadata, MetadataStorage};
    use crate::schema::BuildSchemaOptions;
    use crate::schema::build_context::BuildContext;
    use crate::schema::types_info::TypesInfo;
    use crate::types::{ScalarType, TypeFn, TypeOptions};

    #[test]
    fn test_args_class_expands_ancestors_first() {
        let mut storage = MetadataStorage::new();
        let resolver = storage.declare_class("BookResolver");
        let paging = storage.declare_class("PagingArgs");
        let book_args = storage.declare_subclass("BookArgs", paging);

        let mut paging_class = ClassMetadata::new(paging, "PagingArgs")
            .instance_defaults(|| [("take".to_string(), async_graphql::Value::from(25))].into_iter().collect());
        paging_class.fields = vec![
            FieldMetadata::new(paging, "skip", TypeFn::of(ScalarType::Int)),
            FieldMetadata::new(paging, "take", TypeFn::of(ScalarType::Int)),
        ];
        let mut book_class = ClassMetadata::new(book_args, "BookArgs");
        book_class.fields = vec![
            FieldMetadata::new(book_args, "title", TypeFn::of(ScalarType::String)),
            FieldMetadata::new(book_args, "skip", TypeFn::of(ScalarType::String)),
        ];
        let mut args_types = TargetSpecificStorage::new();
        args_types.collect(paging_class);
        args_types.collect(book_class);

        let info = TypesInfo::default();
        let context = BuildContext::create(BuildSchemaOptions::new([resolver]), &storage).unwrap();
        let types = GraphqlTypeBuilder::new(&info, &context);
        let generator = HandlerArgsGenerator {
            types: &types,
            args_types: &args_types,
            classes: storage.class_table(),
        };

        let params = vec![
            ParamMetadata::new(resolver, "books", 1, ParamKind::Context),
            ParamMetadata::args(resolver, "books", 0, TypeFn::of(book_args)),
        ];
        let generated = generator.generate(&params).unwrap();

        let args: Vec<(String, String)> = generated
            .args
            .values()
            .map(|arg| (arg.name.clone(), arg.type_ref.to_string()))
            .collect();
        assert_eq!(
            args,
            vec![
                ("skip".to_string(), "String!".to_string()),
                ("take".to_string(), "Int!".to_string()),
                ("title".to_string(), "String!".to_string()),
            ]
        );
        assert_eq!(
            generated.args["take"].default_value,
            Some(async_graphql::Value::from(25))
        );
        assert!(matches!(
            generated.params.as_slice(),
            [PreparedParam::Args { validate_as: Some(name) }, PreparedParam::Context] if name == "BookArgs"
        ));
    }

    #[test]
    fn test_unregistered_args_class_is_unresolvable() {
        let mut storage = MetadataStorage::new();
        let resolver = storage.declare_class("BookResolver");
        let stray = storage.declare_class("StrayArgs");
        let args_types = TargetSpecificStorage::new();

        let info = TypesInfo::default();
        let context = BuildContext::create(BuildSchemaOptions::new([resolver]), &storage).unwrap();
        let types = GraphqlTypeBuilder::new(&info, &context);
        let generator = HandlerArgsGenerator {
            types: &types,
            args_types: &args_types,
            classes: storage.class_table(),
        };

        let err = generator
            .generate(&[ParamMetadata::args(resolver, "books", 0, TypeFn::of(stray))])
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "Cannot determine GraphQL input type for 'BookResolver.books'"
        );

        let err = generator
            .generate(&[ParamMetadata::arg(
                resolver,
                "book",
                0,
                "id",
                TypeFn::of(ScalarType::custom("Uuid")),
                TypeOptions::new(),
            )])
            .err()
            .unwrap();
        assert_eq!(err.error_code(), "UNRESOLVABLE_TYPE");
    }
}

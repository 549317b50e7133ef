//! Builders turning type infos into engine types.
//!
//! Every builder runs after the [`TypesInfo`] store is complete, so fields,
//! interfaces and members can reference any registered type.
//!
//! - `unions`: union types and their members
//! - `enums`: enum types
//! - `interfaces`: interface types with inherited fields
//! - `objects`: object types, their interfaces and field resolvers
//! - `inputs`: input types with reconciled defaults

mod enums;
mod inputs;
mod interfaces;
mod objects;
mod unions;

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use super::build_context::BuildContext;
use super::field_spec::FieldSpec;
use super::graphql_type_builder::GraphqlTypeBuilder;
use super::handler_args::{HandlerArgs, HandlerArgsGenerator};
use super::types_info::{SuperClassSearcher, TypesInfo};
use crate::error::Result;
use crate::metadata::{FieldMetadata, MetadataStorage, ParamMetadata, ResolverClassMetadata};
use crate::resolvers::{Endpoint, FieldRuntime, HandlerFn, Middleware, ResolveInfo, Role};
use crate::types::{TypeOptions, TypeValue};

/// Member of a type or root type about to become a field.
pub(crate) struct MemberSource<'m> {
    pub schema_name: &'m str,
    /// Name used in lookup errors, e.g. `Book.title`.
    pub owner: String,
    pub type_value: TypeValue,
    pub type_options: &'m TypeOptions,
    pub description: Option<&'m String>,
    pub deprecation_reason: Option<&'m String>,
    pub params: &'m [ParamMetadata],
    pub roles: Option<&'m [Role]>,
    pub middlewares: &'m [Arc<dyn Middleware>],
    pub resolve: Resolve<'m>,
}

/// How a member produces its value.
pub(crate) enum Resolve<'m> {
    Property(&'m str),
    Handler {
        resolver_class: Option<&'m ResolverClassMetadata>,
        handler: &'m HandlerFn,
    },
}

impl<'m> MemberSource<'m> {
    /// Plain field read from the parent value.
    pub fn property(field: &'m FieldMetadata, parent_type: &str) -> Self {
        Self {
            schema_name: &field.schema_name,
            owner: format!("{parent_type}.{}", field.name),
            type_value: field.get_type.get(),
            type_options: &field.type_options,
            description: field.description.as_ref(),
            deprecation_reason: field.deprecation_reason.as_ref(),
            params: &field.params,
            roles: field.roles.as_deref(),
            middlewares: &field.middlewares,
            resolve: Resolve::Property(&field.name),
        }
    }
}

/// Shared state of the type builders.
pub(crate) struct TypeBuilder<'g, 'a> {
    pub types: &'g GraphqlTypeBuilder<'a>,
    pub info: &'g TypesInfo<'a>,
    pub storage: &'a MetadataStorage,
    pub context: &'a BuildContext,
    pub searcher: SuperClassSearcher<'a>,
}

impl<'g, 'a> TypeBuilder<'g, 'a> {
    pub fn new(types: &'g GraphqlTypeBuilder<'a>, storage: &'a MetadataStorage, context: &'a BuildContext) -> Self {
        Self {
            types,
            info: types.info(),
            storage,
            context,
            searcher: SuperClassSearcher {
                classes: storage.class_table(),
            },
        }
    }

    fn handler_args(&self, params: &[ParamMetadata]) -> Result<HandlerArgs> {
        HandlerArgsGenerator {
            types: self.types,
            args_types: self.storage.args_types(),
            classes: self.storage.class_table(),
        }
        .generate(params)
    }

    /// Builds the field spec and runtime of a member.
    pub fn field(&self, parent_type: &str, member: MemberSource<'_>) -> Result<FieldSpec> {
        let output = self
            .types
            .output_type(&member.owner, member.type_value, member.type_options)?;
        let handler_args = self.handler_args(member.params)?;

        let endpoint = match member.resolve {
            Resolve::Property(name) => Endpoint::Property(name.to_string()),
            Resolve::Handler {
                resolver_class,
                handler,
            } => Endpoint::Handler {
                resolver_class: resolver_class.cloned(),
                handler: handler.clone(),
                params: handler_args.params,
            },
        };

        let settings = self.context.settings.clone();
        let runtime = FieldRuntime {
            info: ResolveInfo {
                field_name: member.schema_name.to_string(),
                parent_type: parent_type.to_string(),
                return_type: output.type_ref.to_string(),
            },
            endpoint,
            middlewares: settings.middleware_chain(member.roles, member.middlewares),
            arg_conversions: handler_args.conversions,
            output: output.kind,
            settings,
        };
        trace!(
            parent = parent_type,
            field = member.schema_name,
            type_ref = %output.type_ref,
            "Synthesized field"
        );

        Ok(FieldSpec {
            name: member.schema_name.to_string(),
            type_ref: output.type_ref,
            description: member.description.cloned(),
            deprecation_reason: member.deprecation_reason.cloned(),
            args: handler_args.args,
            runtime: Arc::new(runtime),
        })
    }

    /// Builds plain property fields keyed by schema name.
    fn property_fields<'f>(
        &self,
        parent_type: &str,
        fields: impl IntoIterator<Item = &'f FieldMetadata>,
    ) -> Result<IndexMap<String, FieldSpec>> {
        fields
            .into_iter()
            .map(|field| {
                let spec = self.field(parent_type, MemberSource::property(field, parent_type))?;
                Ok((spec.name.clone(), spec))
            })
            .collect()
    }
}

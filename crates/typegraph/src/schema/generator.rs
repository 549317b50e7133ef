//! Assembly of the executable schema from a built registry.

use std::collections::HashSet;
use std::sync::Arc;

use async_graphql::dynamic::{Object, Schema, Subscription};
use indexmap::IndexMap;
use tracing::debug;

use super::build_context::BuildContext;
use super::field_spec::FieldSpec;
use super::graphql_type_builder::GraphqlTypeBuilder;
use super::type_builders::{MemberSource, Resolve, TypeBuilder};
use super::types_info::{
    EnumTypeInfo, InterfaceTypeInfo, TypesInfo, UnionTypeInfo, interface_resolver, union_resolver,
};
use crate::error::{Result, SchemaError};
use crate::metadata::{
    ClassMetadata, MetadataStorage, ResolverMetadata, SubscriptionResolverMetadata,
};
use crate::resolvers::EnumMapping;
use crate::subscriptions::SubscriptionSource;

pub(crate) const QUERY_TYPE: &str = "Query";
pub(crate) const MUTATION_TYPE: &str = "Mutation";
pub(crate) const SUBSCRIPTION_TYPE: &str = "Subscription";

/// Generates the schema of a built registry.
pub(crate) struct SchemaGenerator<'a> {
    storage: &'a MetadataStorage,
    context: &'a BuildContext,
}

impl<'a> SchemaGenerator<'a> {
    pub fn new(storage: &'a MetadataStorage, context: &'a BuildContext) -> Self {
        Self { storage, context }
    }

    pub fn generate(&self) -> Result<Schema> {
        let info = self.types_info();
        let has_mutations = self.mutations().next().is_some();
        let has_subscriptions = self.subscriptions().next().is_some();
        check_type_names(&info, has_mutations, has_subscriptions)?;
        debug!(
            unions = info.unions.len(),
            enums = info.enums.len(),
            interfaces = info.interfaces.len(),
            object_types = info.objects.len(),
            input_types = info.inputs.len(),
            "Registered type infos"
        );

        let types = GraphqlTypeBuilder::new(&info, self.context);
        let builder = TypeBuilder::new(&types, self.storage, self.context);

        let mut schema = Schema::build(
            QUERY_TYPE,
            has_mutations.then_some(MUTATION_TYPE),
            has_subscriptions.then_some(SUBSCRIPTION_TYPE),
        );

        schema = schema.register(self.root_type(&builder, QUERY_TYPE, self.queries())?);
        if has_mutations {
            schema = schema.register(self.root_type(&builder, MUTATION_TYPE, self.mutations())?);
        }
        if has_subscriptions {
            schema = schema.register(self.subscription_type(&builder)?);
        }

        for union in &info.unions {
            schema = schema.register(builder.build_union(union)?);
        }
        for enum_info in &info.enums {
            schema = schema.register(builder.build_enum(enum_info));
        }
        for interface in &info.interfaces {
            schema = schema.register(builder.build_interface(interface)?);
        }
        for &object in &info.objects {
            schema = schema.register(builder.build_object(object)?);
        }
        for &input in &info.inputs {
            schema = schema.register(builder.build_input(input)?);
        }

        let scalars = types.into_used_scalars();
        debug!(scalars = scalars.len(), "Registering used scalars");
        for scalar in scalars {
            schema = schema.register(scalar);
        }

        let config = self.context.config();
        schema = schema
            .limit_depth(config.max_depth)
            .limit_complexity(config.max_complexity);
        if !config.introspection {
            schema = schema.disable_introspection();
        }

        let schema = schema
            .finish()
            .map_err(|e| SchemaError::Engine(e.to_string()))?;
        debug!("Schema generation complete");
        Ok(schema)
    }

    /// Registers every type info in dependency order: unions, enums,
    /// interfaces, objects, inputs.
    fn types_info(&self) -> TypesInfo<'a> {
        let classes = Arc::new(self.storage.class_table().clone());
        let objects: Vec<&'a ClassMetadata> = self.storage.object_types().iter().collect();
        let mut info = TypesInfo::default();

        for metadata in self.storage.unions() {
            info.add_union(UnionTypeInfo {
                metadata,
                resolver: union_resolver(metadata, &objects, &classes),
            });
        }
        for metadata in self.storage.enums() {
            info.add_enum(EnumTypeInfo {
                metadata,
                mapping: Arc::new(EnumMapping::new(metadata)),
            });
        }
        for metadata in self.storage.interface_types().iter() {
            info.add_interface(InterfaceTypeInfo {
                metadata,
                resolver: interface_resolver(metadata, &objects, &classes),
            });
        }
        for metadata in objects {
            info.add_object(metadata);
        }
        for metadata in self.storage.input_types().iter() {
            info.add_input(metadata);
        }
        info
    }

    /// Whether a handler belongs in the schema: owned by a listed resolver
    /// class that is not abstract.
    fn is_exposed(&self, handler: &ResolverMetadata) -> bool {
        !handler.is_abstract() && self.context.includes_resolver(handler.target)
    }

    fn queries(&self) -> impl Iterator<Item = &'a ResolverMetadata> + '_ {
        self.storage
            .queries()
            .iter()
            .filter(|handler| self.is_exposed(handler))
    }

    fn mutations(&self) -> impl Iterator<Item = &'a ResolverMetadata> + '_ {
        self.storage
            .mutations()
            .iter()
            .filter(|handler| self.is_exposed(handler))
    }

    fn subscriptions(&self) -> impl Iterator<Item = &'a SubscriptionResolverMetadata> + '_ {
        self.storage
            .subscriptions()
            .iter()
            .filter(|subscription| self.is_exposed(&subscription.base))
    }

    fn handler_member<'m>(&self, handler: &'m ResolverMetadata) -> Result<MemberSource<'m>> {
        let class_name = self.storage.class_table().name(handler.target);
        let (Some(get_type), Some(type_options)) =
            (&handler.get_return_type, &handler.return_type_options)
        else {
            return Err(SchemaError::no_explicit_type(class_name, &handler.method_name));
        };
        Ok(MemberSource {
            schema_name: &handler.schema_name,
            owner: format!("{class_name}.{}", handler.method_name),
            type_value: get_type.get(),
            type_options,
            description: handler.description.as_ref(),
            deprecation_reason: handler.deprecation_reason.as_ref(),
            params: &handler.params,
            roles: handler.roles.as_deref(),
            middlewares: &handler.middlewares,
            resolve: Resolve::Handler {
                resolver_class: handler.resolver_class.as_ref(),
                handler: &handler.handler,
            },
        })
    }

    /// Fields of a root type keyed by schema name. A later handler replaces
    /// an earlier one with the same name.
    fn root_fields(
        &self,
        builder: &TypeBuilder<'_, '_>,
        root: &str,
        handlers: impl Iterator<Item = &'a ResolverMetadata>,
    ) -> Result<IndexMap<String, FieldSpec>> {
        let mut fields = IndexMap::new();
        for handler in handlers {
            let spec = builder.field(root, self.handler_member(handler)?)?;
            fields.insert(spec.name.clone(), spec);
        }
        Ok(fields)
    }

    fn root_type(
        &self,
        builder: &TypeBuilder<'_, '_>,
        root: &str,
        handlers: impl Iterator<Item = &'a ResolverMetadata>,
    ) -> Result<Object> {
        let fields = self.root_fields(builder, root, handlers)?;
        debug!(root, fields = fields.len(), "Built root type");
        Ok(fields
            .into_values()
            .fold(Object::new(root), |object, spec| object.field(spec.into_field())))
    }

    fn subscription_type(&self, builder: &TypeBuilder<'_, '_>) -> Result<Subscription> {
        let mut fields = IndexMap::new();
        for subscription in self.subscriptions() {
            let handler = &subscription.base;
            let class_name = self.storage.class_table().name(handler.target);
            if subscription.topics.is_statically_empty() {
                return Err(SchemaError::missing_topics(class_name, &handler.method_name));
            }

            let spec = builder.field(SUBSCRIPTION_TYPE, self.handler_member(handler)?)?;
            let source = SubscriptionSource {
                topics: subscription.topics.clone(),
                filter: subscription.filter.clone(),
                pubsub: Arc::clone(self.context.pub_sub()),
                class_name,
                method_name: handler.method_name.clone(),
            };
            fields.insert(spec.name.clone(), (spec, source));
        }

        debug!(root = SUBSCRIPTION_TYPE, fields = fields.len(), "Built root type");
        Ok(fields.into_values().fold(
            Subscription::new(SUBSCRIPTION_TYPE),
            |subscription, (spec, source)| subscription.field(spec.into_subscription_field(source)),
        ))
    }
}

/// Rejects schema type names used by more than one registered type.
fn check_type_names(info: &TypesInfo<'_>, has_mutations: bool, has_subscriptions: bool) -> Result<()> {
    let roots = [
        Some(QUERY_TYPE),
        has_mutations.then_some(MUTATION_TYPE),
        has_subscriptions.then_some(SUBSCRIPTION_TYPE),
    ];
    let names = roots
        .into_iter()
        .flatten()
        .chain(info.unions.iter().map(|u| u.metadata.name.as_str()))
        .chain(info.enums.iter().map(|e| e.metadata.name.as_str()))
        .chain(info.interfaces.iter().map(|i| i.metadata.name.as_str()))
        .chain(info.objects.iter().map(|o| o.name.as_str()))
        .chain(info.inputs.iter().map(|i| i.name.as_str()));

    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(SchemaError::DuplicateTypeName {
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

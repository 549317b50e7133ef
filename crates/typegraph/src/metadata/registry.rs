//! The metadata registry.
//!
//! Declarations are collected into a [`MetadataStorage`] in any order. A
//! single [`MetadataStorage::build`] then cross-links the records in a fixed
//! pass order.

use std::sync::{Mutex, OnceLock};

use async_graphql::Value;
use indexmap::IndexMap;
use tracing::debug;

use super::builders::{
    BaseResolverMetadataBuilder, ClassMetadataBuilder, FieldResolverMetadataBuilder,
    HandlerStorages, MemberLinks, ResolverClassMetadataBuilder,
};
use super::classes::{ClassTable, EnumId, TargetId, UnionId};
use super::definitions::{
    AuthorizedMetadata, ClassMetadata, EnumMetadata, FieldMetadata, FieldResolverMetadata,
    MiddlewareMetadata, ParamMetadata, ResolverClassMetadata, ResolverMetadata,
    SubscriptionResolverMetadata, UnionMetadata,
};
use super::storage::TargetSpecificStorage;
use crate::error::{Result, SchemaError};

/// Registry of every declaration that makes up a schema.
#[derive(Debug, Default)]
pub struct MetadataStorage {
    classes: ClassTable,
    next_enum_id: u32,
    next_union_id: u32,
    built: bool,

    queries: TargetSpecificStorage<ResolverMetadata>,
    mutations: TargetSpecificStorage<ResolverMetadata>,
    subscriptions: TargetSpecificStorage<SubscriptionResolverMetadata>,
    field_resolvers: TargetSpecificStorage<FieldResolverMetadata>,
    object_types: TargetSpecificStorage<ClassMetadata>,
    input_types: TargetSpecificStorage<ClassMetadata>,
    args_types: TargetSpecificStorage<ClassMetadata>,
    interface_types: TargetSpecificStorage<ClassMetadata>,
    authorized_fields: TargetSpecificStorage<AuthorizedMetadata>,
    enums: Vec<EnumMetadata>,
    unions: Vec<UnionMetadata>,
    middlewares: TargetSpecificStorage<MiddlewareMetadata>,
    resolver_classes: TargetSpecificStorage<ResolverClassMetadata>,
    fields: TargetSpecificStorage<FieldMetadata>,
    params: TargetSpecificStorage<ParamMetadata>,
}

impl MetadataStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a class and returns its handle.
    pub fn declare_class(&mut self, name: impl Into<String>) -> TargetId {
        self.classes.declare(name, None)
    }

    /// Declares a class extending `parent`.
    pub fn declare_subclass(&mut self, name: impl Into<String>, parent: TargetId) -> TargetId {
        self.classes.declare(name, Some(parent))
    }

    pub fn class_table(&self) -> &ClassTable {
        &self.classes
    }

    pub fn collect_query_handler(&mut self, definition: ResolverMetadata) {
        self.queries.collect(definition);
    }

    pub fn collect_mutation_handler(&mut self, definition: ResolverMetadata) {
        self.mutations.collect(definition);
    }

    pub fn collect_subscription_handler(&mut self, definition: SubscriptionResolverMetadata) {
        self.subscriptions.collect(definition);
    }

    pub fn collect_field_resolver(&mut self, definition: FieldResolverMetadata) {
        self.field_resolvers.collect(definition);
    }

    pub fn collect_object_metadata(&mut self, definition: ClassMetadata) {
        self.object_types.collect(definition);
    }

    pub fn collect_input_metadata(&mut self, definition: ClassMetadata) {
        self.input_types.collect(definition);
    }

    pub fn collect_args_metadata(&mut self, definition: ClassMetadata) {
        self.args_types.collect(definition);
    }

    pub fn collect_interface_metadata(&mut self, definition: ClassMetadata) {
        self.interface_types.collect(definition);
    }

    pub fn collect_authorized_field(&mut self, definition: AuthorizedMetadata) {
        self.authorized_fields.collect(definition);
    }

    pub fn collect_middleware(&mut self, definition: MiddlewareMetadata) {
        self.middlewares.collect(definition);
    }

    pub fn collect_resolver_class(&mut self, definition: ResolverClassMetadata) {
        self.resolver_classes.collect(definition);
    }

    pub fn collect_class_field(&mut self, definition: FieldMetadata) {
        self.fields.collect(definition);
    }

    pub fn collect_handler_param(&mut self, definition: ParamMetadata) {
        self.params.collect(definition);
    }

    /// Registers an enum; `values` maps item names to internal values.
    pub fn register_enum_type<I, K, V>(
        &mut self,
        name: impl Into<String>,
        values: I,
        description: Option<String>,
    ) -> EnumId
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let id = EnumId(self.next_enum_id);
        self.next_enum_id += 1;
        self.enums.push(EnumMetadata {
            id,
            name: name.into(),
            description,
            values: values
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect::<IndexMap<_, _>>(),
        });
        id
    }

    /// Registers a union of object types and returns the handle standing in
    /// for its type.
    pub fn create_union_type(
        &mut self,
        name: impl Into<String>,
        types: Vec<TargetId>,
        description: Option<String>,
    ) -> UnionId {
        let id = UnionId(self.next_union_id);
        self.next_union_id += 1;
        self.unions.push(UnionMetadata {
            id,
            name: name.into(),
            description,
            types,
        });
        id
    }

    /// Cross-links every collected record.
    ///
    /// Pass order: object, input, args and interface types; field resolvers;
    /// queries, mutations and subscriptions; resolver class inheritance.
    pub fn build(&mut self) -> Result<()> {
        if self.built {
            return Err(SchemaError::RegistryAlreadyBuilt);
        }

        let links = MemberLinks {
            params: &self.params,
            authorized: &self.authorized_fields,
            middlewares: &self.middlewares,
        };

        let class_builder = ClassMetadataBuilder { links };
        for storage in [
            &mut self.object_types,
            &mut self.input_types,
            &mut self.args_types,
            &mut self.interface_types,
        ] {
            for def in storage.iter_mut() {
                class_builder.build(def, &mut self.fields);
            }
        }
        debug!(
            object_types = self.object_types.len(),
            input_types = self.input_types.len(),
            args_types = self.args_types.len(),
            interface_types = self.interface_types.len(),
            "Built class metadata"
        );

        let base_builder = BaseResolverMetadataBuilder {
            links,
            resolver_classes: &self.resolver_classes,
            classes: &self.classes,
        };
        let field_resolver_builder = FieldResolverMetadataBuilder {
            base: BaseResolverMetadataBuilder {
                links,
                resolver_classes: &self.resolver_classes,
                classes: &self.classes,
            },
        };
        for def in self.field_resolvers.iter_mut() {
            field_resolver_builder.build(def, &mut self.object_types, &mut self.fields)?;
        }
        debug!(field_resolvers = self.field_resolvers.len(), "Built field resolvers");

        for def in self.queries.iter_mut() {
            base_builder.build(def)?;
        }
        for def in self.mutations.iter_mut() {
            base_builder.build(def)?;
        }
        for def in self.subscriptions.iter_mut() {
            base_builder.build(&mut def.base)?;
        }
        debug!(
            queries = self.queries.len(),
            mutations = self.mutations.len(),
            subscriptions = self.subscriptions.len(),
            "Built root handlers"
        );

        let resolver_class_builder = ResolverClassMetadataBuilder {
            resolver_classes: &self.resolver_classes,
            classes: &self.classes,
        };
        let mut storages = HandlerStorages {
            queries: &mut self.queries,
            mutations: &mut self.mutations,
            subscriptions: &mut self.subscriptions,
            field_resolvers: &mut self.field_resolvers,
            object_types: &mut self.object_types,
            fields: &mut self.fields,
        };
        for def in self.resolver_classes.iter() {
            resolver_class_builder.build(def, &mut storages)?;
        }
        debug!(
            resolver_classes = self.resolver_classes.len(),
            "Propagated inherited resolver handlers"
        );

        self.built = true;
        Ok(())
    }

    /// Resets every storage so declarations can be collected again.
    ///
    /// Class, enum and union handles stay valid.
    pub fn clear(&mut self) {
        self.queries.clear();
        self.mutations.clear();
        self.subscriptions.clear();
        self.field_resolvers.clear();
        self.object_types.clear();
        self.input_types.clear();
        self.args_types.clear();
        self.interface_types.clear();
        self.authorized_fields.clear();
        self.enums.clear();
        self.unions.clear();
        self.middlewares.clear();
        self.resolver_classes.clear();
        self.fields.clear();
        self.params.clear();
        self.built = false;
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn queries(&self) -> &TargetSpecificStorage<ResolverMetadata> {
        &self.queries
    }

    pub fn mutations(&self) -> &TargetSpecificStorage<ResolverMetadata> {
        &self.mutations
    }

    pub fn subscriptions(&self) -> &TargetSpecificStorage<SubscriptionResolverMetadata> {
        &self.subscriptions
    }

    pub fn field_resolvers(&self) -> &TargetSpecificStorage<FieldResolverMetadata> {
        &self.field_resolvers
    }

    pub fn object_types(&self) -> &TargetSpecificStorage<ClassMetadata> {
        &self.object_types
    }

    pub fn input_types(&self) -> &TargetSpecificStorage<ClassMetadata> {
        &self.input_types
    }

    pub fn args_types(&self) -> &TargetSpecificStorage<ClassMetadata> {
        &self.args_types
    }

    pub fn interface_types(&self) -> &TargetSpecificStorage<ClassMetadata> {
        &self.interface_types
    }

    pub fn authorized_fields(&self) -> &TargetSpecificStorage<AuthorizedMetadata> {
        &self.authorized_fields
    }

    pub fn enums(&self) -> &[EnumMetadata] {
        &self.enums
    }

    pub fn unions(&self) -> &[UnionMetadata] {
        &self.unions
    }

    pub fn resolver_classes(&self) -> &TargetSpecificStorage<ResolverClassMetadata> {
        &self.resolver_classes
    }
}

static DEFAULT_STORAGE: OnceLock<Mutex<MetadataStorage>> = OnceLock::new();

/// Process-wide registry for callers that want implicit access.
///
/// Nothing in this crate reads it; schema builders always take an explicit
/// registry.
pub fn default_metadata_storage() -> &'static Mutex<MetadataStorage> {
    DEFAULT_STORAGE.get_or_init(|| Mutex::new(MetadataStorage::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::{ResolvedValue, handler};
    use crate::types::{ScalarType, TypeFn};

    fn books_query(target: TargetId) -> ResolverMetadata {
        ResolverMetadata::new(
            target,
            "books",
            TypeFn::of(ScalarType::String),
            handler(|_| async { Ok(ResolvedValue::Null) }),
        )
    }

    #[test]
    fn test_build_is_single_shot_until_cleared() {
        let mut storage = MetadataStorage::new();
        let resolver = storage.declare_class("BookResolver");
        storage.collect_resolver_class(ResolverClassMetadata::new(resolver));
        storage.collect_query_handler(books_query(resolver));

        storage.build().expect("first build");
        assert!(storage.is_built());
        assert!(matches!(storage.build(), Err(SchemaError::RegistryAlreadyBuilt)));

        storage.clear();
        assert!(!storage.is_built());
        assert!(storage.queries().is_empty());
        assert_eq!(storage.class_table().name(resolver), "BookResolver");

        storage.collect_resolver_class(ResolverClassMetadata::new(resolver));
        storage.collect_query_handler(books_query(resolver));
        storage.build().expect("build after clear");
    }

    #[test]
    fn test_handler_without_resolver_class_fails() {
        let mut storage = MetadataStorage::new();
        let plain = storage.declare_class("NotAResolver");
        storage.collect_query_handler(books_query(plain));

        let err = storage.build().expect_err("must fail");
        assert!(matches!(
            err,
            SchemaError::UnknownResolverClass { ref class_name, .. } if class_name == "NotAResolver"
        ));
    }

    #[test]
    fn test_build_links_roles_and_class() {
        let mut storage = MetadataStorage::new();
        let resolver = storage.declare_class("BookResolver");
        storage.collect_resolver_class(ResolverClassMetadata::new(resolver));
        storage.collect_query_handler(books_query(resolver));
        storage.collect_authorized_field(AuthorizedMetadata::new(resolver, "books", ["admin"]));

        storage.build().expect("build");
        let query = storage.queries().find(resolver).expect("query");
        assert_eq!(query.roles, Some(vec!["admin".to_string()]));
        assert_eq!(
            query.resolver_class.as_ref().map(|class| class.target),
            Some(resolver)
        );
    }

    #[test]
    fn test_enum_and_union_handles_are_distinct() {
        let mut storage = MetadataStorage::new();
        let a = storage.declare_class("A");
        let first = storage.register_enum_type("Color", [("RED", "red")], None);
        let second = storage.register_enum_type("Size", [("S", 1)], None);
        assert_ne!(first, second);

        let union = storage.create_union_type("Result", vec![a], Some("Search result".into()));
        assert_eq!(storage.unions()[0].id, union);
        assert_eq!(storage.enums()[0].values.get("RED"), Some(&Value::from("red")));
    }

    #[test]
    fn test_default_storage_is_shared() {
        let first = default_metadata_storage() as *const _;
        let second = default_metadata_storage() as *const _;
        assert_eq!(first, second);
    }
}

use tracing::trace;

use super::field_resolver::link_external_field;
use crate::error::Result;
use crate::metadata::classes::{ClassTable, TargetId};
use crate::metadata::definitions::{
    ClassMetadata, FieldMetadata, FieldResolverKind, FieldResolverMetadata, ResolverClassMetadata,
    ResolverMetadata, SubscriptionResolverMetadata,
};
use crate::metadata::storage::TargetSpecificStorage;

/// Copies handlers of resolver class ancestors onto their subclasses.
pub(crate) struct ResolverClassMetadataBuilder<'a> {
    pub resolver_classes: &'a TargetSpecificStorage<ResolverClassMetadata>,
    pub classes: &'a ClassTable,
}

/// Handler storages updated by inheritance propagation.
pub(crate) struct HandlerStorages<'a> {
    pub queries: &'a mut TargetSpecificStorage<ResolverMetadata>,
    pub mutations: &'a mut TargetSpecificStorage<ResolverMetadata>,
    pub subscriptions: &'a mut TargetSpecificStorage<SubscriptionResolverMetadata>,
    pub field_resolvers: &'a mut TargetSpecificStorage<FieldResolverMetadata>,
    pub object_types: &'a mut TargetSpecificStorage<ClassMetadata>,
    pub fields: &'a mut TargetSpecificStorage<FieldMetadata>,
}

impl ResolverClassMetadataBuilder<'_> {
    pub fn build(&self, def: &ResolverClassMetadata, storages: &mut HandlerStorages<'_>) -> Result<()> {
        for ancestor in self.classes.ancestors(def.target) {
            if self.resolver_classes.find(ancestor).is_none() {
                continue;
            }
            trace!(
                resolver = %self.classes.name(def.target),
                ancestor = %self.classes.name(ancestor),
                "Inheriting resolver handlers"
            );

            let queries = inherit(storages.queries, ancestor, def, |m| m);
            storages.queries.unshift(queries);
            let mutations = inherit(storages.mutations, ancestor, def, |m| m);
            storages.mutations.unshift(mutations);
            let subscriptions = inherit(storages.subscriptions, ancestor, def, |m| &mut m.base);
            storages.subscriptions.unshift(subscriptions);

            let mut field_resolvers = inherit(storages.field_resolvers, ancestor, def, |m| &mut m.base);
            for field_resolver in &mut field_resolvers {
                if field_resolver.get_object_type.is_none() {
                    field_resolver.get_object_type = def.get_object_type.clone();
                    if field_resolver.kind == FieldResolverKind::External {
                        link_external_field(
                            field_resolver,
                            storages.object_types,
                            storages.fields,
                            self.classes,
                        )?;
                    }
                }
            }
            storages.field_resolvers.unshift(field_resolvers);
        }
        Ok(())
    }
}

/// Clones the handlers owned by `ancestor`, re-stamped onto `def`.
fn inherit<T, F>(
    storage: &TargetSpecificStorage<T>,
    ancestor: TargetId,
    def: &ResolverClassMetadata,
    base: F,
) -> Vec<T>
where
    T: Clone + crate::metadata::Owned,
    F: Fn(&mut T) -> &mut ResolverMetadata,
{
    storage
        .find_many(ancestor)
        .cloned()
        .map(|mut metadata| {
            let resolver = base(&mut metadata);
            resolver.target = def.target;
            resolver.resolver_class = Some(def.clone());
            metadata
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::{ResolvedValue, handler};
    use crate::types::{ObjectTypeFn, ScalarType, TypeFn};

    #[test]
    fn test_inherited_handlers_precede_own_ones() {
        let mut classes = ClassTable::new();
        let book = classes.declare("Book", None);
        let base = classes.declare("BaseCrud", None);
        let crud = classes.declare("BookCrud", Some(base));

        let base_class = ResolverClassMetadata::new(base).abstract_class();
        let crud_class = ResolverClassMetadata::new(crud).object_type(ObjectTypeFn::of(book));
        let mut resolver_classes = TargetSpecificStorage::new();
        resolver_classes.collect(base_class.clone());
        resolver_classes.collect(crud_class.clone());

        let noop = handler(|_| async { Ok(ResolvedValue::Null) });
        let mut base_create =
            ResolverMetadata::new(base, "create", TypeFn::of(book), noop.clone());
        base_create.resolver_class = Some(base_class);
        let mut own_list = ResolverMetadata::new(crud, "list", TypeFn::of(ScalarType::Int), noop);
        own_list.resolver_class = Some(crud_class.clone());

        let mut queries = TargetSpecificStorage::new();
        let mut mutations = TargetSpecificStorage::new();
        mutations.collect(base_create);
        mutations.collect(own_list);
        let mut subscriptions = TargetSpecificStorage::new();
        let mut field_resolvers = TargetSpecificStorage::new();
        let mut object_types = TargetSpecificStorage::new();
        let mut fields = TargetSpecificStorage::new();

        let builder = ResolverClassMetadataBuilder {
            resolver_classes: &resolver_classes,
            classes: &classes,
        };
        let mut storages = HandlerStorages {
            queries: &mut queries,
            mutations: &mut mutations,
            subscriptions: &mut subscriptions,
            field_resolvers: &mut field_resolvers,
            object_types: &mut object_types,
            fields: &mut fields,
        };
        builder.build(&crud_class, &mut storages).expect("propagation");

        let order: Vec<_> = mutations
            .iter()
            .map(|m| (classes.name(m.target), m.method_name.clone(), m.is_abstract()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("BookCrud".to_string(), "create".to_string(), false),
                ("BaseCrud".to_string(), "create".to_string(), true),
                ("BookCrud".to_string(), "list".to_string(), false),
            ]
        );
    }
}

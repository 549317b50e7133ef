use tracing::{trace, warn};

use super::BaseResolverMetadataBuilder;
use crate::error::{Result, SchemaError};
use crate::metadata::classes::ClassTable;
use crate::metadata::definitions::{
    ClassMetadata, FieldMetadata, FieldResolverKind, FieldResolverMetadata,
};
use crate::metadata::storage::TargetSpecificStorage;
use crate::types::ObjectTypeFn;

/// Links field resolvers and reconciles external ones with the fields they
/// resolve.
pub(crate) struct FieldResolverMetadataBuilder<'a> {
    pub base: BaseResolverMetadataBuilder<'a>,
}

impl FieldResolverMetadataBuilder<'_> {
    pub fn build(
        &self,
        def: &mut FieldResolverMetadata,
        object_types: &mut TargetSpecificStorage<ClassMetadata>,
        fields: &mut TargetSpecificStorage<FieldMetadata>,
    ) -> Result<()> {
        match def.kind {
            FieldResolverKind::Internal => {
                self.base.build_detached(&mut def.base);
                def.get_object_type = Some(ObjectTypeFn::of(def.base.target));
                Ok(())
            }
            FieldResolverKind::External => {
                self.base.build(&mut def.base)?;
                def.get_object_type = def
                    .base
                    .resolver_class
                    .as_ref()
                    .and_then(|class| class.get_object_type.clone());
                link_external_field(def, object_types, fields, self.base.classes)
            }
        }
    }
}

/// Binds an external field resolver to the field it resolves on its object
/// type, synthesizing the field when the object type does not declare it.
pub(crate) fn link_external_field(
    def: &mut FieldResolverMetadata,
    object_types: &mut TargetSpecificStorage<ClassMetadata>,
    fields: &mut TargetSpecificStorage<FieldMetadata>,
    classes: &ClassTable,
) -> Result<()> {
    let class_name = classes.name(def.base.target);
    let Some(get_object_type) = def.get_object_type.clone() else {
        if def.base.is_abstract() {
            warn!(
                resolver = %class_name,
                method = %def.base.method_name,
                "Abstract resolver class has no object type, field resolver left unbound"
            );
            return Ok(());
        }
        return Err(SchemaError::MissingObjectType { class_name });
    };

    let object_target = get_object_type.get();
    let Some(object_type) = object_types.find_mut(object_target) else {
        return Err(SchemaError::unresolvable_output(format!(
            "{class_name}.{}",
            def.base.method_name
        )));
    };

    let method_name = def.base.method_name.clone();
    let linked = match object_type.field_mut(&method_name) {
        Some(field) => {
            field.complexity = def.base.complexity;
            if field.params.is_empty() {
                field.params = def.base.params.clone();
            }
            if def.base.roles.is_some() {
                field.roles = def.base.roles.clone();
            } else if field.roles.is_some() {
                def.base.roles = field.roles.clone();
            }
            field.clone()
        }
        None => {
            let (Some(get_type), Some(type_options)) = (
                def.base.get_return_type.clone(),
                def.base.return_type_options.clone(),
            ) else {
                return Err(SchemaError::no_explicit_type(class_name, method_name));
            };
            let field = FieldMetadata {
                target: object_target,
                name: method_name.clone(),
                schema_name: def.base.schema_name.clone(),
                get_type,
                type_options,
                description: def.base.description.clone(),
                deprecation_reason: def.base.deprecation_reason.clone(),
                complexity: def.base.complexity,
                roles: def.base.roles.clone(),
                params: def.base.params.clone(),
                middlewares: def.base.middlewares.clone(),
            };
            trace!(
                object_type = %object_type.name,
                field = %method_name,
                "Synthesized field from external resolver"
            );
            object_type.fields.push(field.clone());
            fields.collect(field);
            return Ok(());
        }
    };

    if let Some(stored) = fields
        .iter_mut()
        .find(|field| field.target == object_target && field.name == method_name)
    {
        *stored = linked;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::builders::MemberLinks;
    use crate::metadata::{AuthorizedMetadata, ResolverClassMetadata};
    use crate::resolvers::{ResolvedValue, handler};
    use crate::types::{ScalarType, TypeFn, TypeOptions};

    struct Fixture {
        classes: ClassTable,
        item: crate::metadata::TargetId,
        resolver: crate::metadata::TargetId,
        object_types: TargetSpecificStorage<ClassMetadata>,
        fields: TargetSpecificStorage<FieldMetadata>,
        resolver_classes: TargetSpecificStorage<ResolverClassMetadata>,
        authorized: TargetSpecificStorage<AuthorizedMetadata>,
    }

    fn fixture() -> Fixture {
        let mut classes = ClassTable::new();
        let item = classes.declare("Item", None);
        let resolver = classes.declare("ItemResolver", None);

        let name = FieldMetadata::new(item, "name", TypeFn::of(ScalarType::String));
        let mut fields = TargetSpecificStorage::new();
        fields.collect(name.clone());
        let mut item_type = ClassMetadata::new(item, "Item");
        item_type.fields.push(name);
        let mut object_types = TargetSpecificStorage::new();
        object_types.collect(item_type);

        let mut resolver_classes = TargetSpecificStorage::new();
        resolver_classes.collect(ResolverClassMetadata::new(resolver).object_type(ObjectTypeFn::of(item)));

        Fixture {
            classes,
            item,
            resolver,
            object_types,
            fields,
            resolver_classes,
            authorized: TargetSpecificStorage::new(),
        }
    }

    fn build(fixture: &mut Fixture, def: &mut FieldResolverMetadata) -> Result<()> {
        let params = TargetSpecificStorage::new();
        let middlewares = TargetSpecificStorage::new();
        let builder = FieldResolverMetadataBuilder {
            base: BaseResolverMetadataBuilder {
                links: MemberLinks {
                    params: &params,
                    authorized: &fixture.authorized,
                    middlewares: &middlewares,
                },
                resolver_classes: &fixture.resolver_classes,
                classes: &fixture.classes,
            },
        };
        builder.build(def, &mut fixture.object_types, &mut fixture.fields)
    }

    fn noop() -> crate::resolvers::HandlerFn {
        handler(|_| async { Ok(ResolvedValue::Null) })
    }

    #[test]
    fn test_missing_field_without_explicit_type_fails() {
        let mut fixture = fixture();
        let mut def = FieldResolverMetadata::external(fixture.resolver, "price", noop());

        let err = build(&mut fixture, &mut def).expect_err("must fail");
        assert!(matches!(
            &err,
            SchemaError::NoExplicitType { class_name, method_name }
                if class_name == "ItemResolver" && method_name == "price"
        ));
    }

    #[test]
    fn test_missing_field_with_explicit_type_is_synthesized() {
        let mut fixture = fixture();
        let mut def = FieldResolverMetadata::external(fixture.resolver, "price", noop())
            .with_return_type(TypeFn::of(ScalarType::Float))
            .with_return_type_options(TypeOptions::new())
            .complexity(3);

        build(&mut fixture, &mut def).expect("build");
        let item = fixture.object_types.find(fixture.item).expect("item type");
        let price = item.field("price").expect("synthesized field");
        assert_eq!(price.target, fixture.item);
        assert_eq!(price.complexity, Some(3));
        assert!(fixture.fields.find_member(fixture.item, "price").is_some());
    }

    #[test]
    fn test_existing_field_absorbs_resolver_roles_and_complexity() {
        let mut fixture = fixture();
        fixture
            .authorized
            .collect(AuthorizedMetadata::new(fixture.resolver, "name", ["admin"]));
        let mut def = FieldResolverMetadata::external(fixture.resolver, "name", noop()).complexity(5);

        build(&mut fixture, &mut def).expect("build");
        let item = fixture.object_types.find(fixture.item).expect("item type");
        let name = item.field("name").expect("field");
        assert_eq!(name.complexity, Some(5));
        assert_eq!(name.roles, Some(vec!["admin".to_string()]));
        let stored = fixture.fields.find_member(fixture.item, "name").expect("stored");
        assert_eq!(stored.roles, Some(vec!["admin".to_string()]));
    }

    #[test]
    fn test_field_roles_flow_back_to_unguarded_resolver() {
        let mut fixture = fixture();
        let item = fixture.item;
        fixture
            .object_types
            .find_mut(item)
            .and_then(|class| class.field_mut("name"))
            .expect("field")
            .roles = Some(vec!["reader".into()]);
        let mut def = FieldResolverMetadata::external(fixture.resolver, "name", noop());

        build(&mut fixture, &mut def).expect("build");
        assert_eq!(def.base.roles, Some(vec!["reader".to_string()]));
    }

    #[test]
    fn test_concrete_resolver_without_object_type_fails() {
        let mut fixture = fixture();
        let orphan = fixture.classes.declare("OrphanResolver", None);
        fixture.resolver_classes.collect(ResolverClassMetadata::new(orphan));
        let mut def = FieldResolverMetadata::external(orphan, "price", noop());

        let err = build(&mut fixture, &mut def).expect_err("must fail");
        assert!(matches!(err, SchemaError::MissingObjectType { .. }));
    }

    #[test]
    fn test_abstract_resolver_without_object_type_is_left_unbound() {
        let mut fixture = fixture();
        let base = fixture.classes.declare("BaseResolver", None);
        fixture
            .resolver_classes
            .collect(ResolverClassMetadata::new(base).abstract_class());
        let mut def = FieldResolverMetadata::external(base, "price", noop());

        build(&mut fixture, &mut def).expect("build");
        assert!(def.get_object_type.is_none());
    }

    #[test]
    fn test_internal_resolver_targets_own_class() {
        let mut fixture = fixture();
        let item = fixture.item;
        let mut def = FieldResolverMetadata::internal(item, "name", noop());

        build(&mut fixture, &mut def).expect("build");
        assert_eq!(def.get_object_type.as_ref().map(ObjectTypeFn::get), Some(item));
        assert!(def.base.resolver_class.is_none());
    }
}

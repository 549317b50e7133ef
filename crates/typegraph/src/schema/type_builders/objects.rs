use async_graphql::dynamic::Object;
use indexmap::IndexMap;
use tracing::trace;

use super::{MemberSource, Resolve, TypeBuilder};
use crate::error::Result;
use crate::metadata::{ClassMetadata, FieldMetadata, FieldResolverKind, FieldResolverMetadata};
use crate::schema::field_spec::{FieldSpec, merge_fields};

impl<'a> TypeBuilder<'_, 'a> {
    /// Fields of an object type keyed by schema name.
    ///
    /// Interface fields have the lowest precedence, then the fields of the
    /// registered supertype, then the object's own fields.
    fn object_field_metadata(&self, class: &'a ClassMetadata) -> IndexMap<String, &'a FieldMetadata> {
        let mut fields = IndexMap::new();
        for interface in &class.interfaces {
            if let Some(info) = self.info.find_interface(*interface) {
                merge_fields(&mut fields, self.interface_field_metadata(info.metadata));
            }
        }
        if let Some(parent) = self.searcher.object_type(self.info, class) {
            merge_fields(&mut fields, self.object_field_metadata(parent));
        }
        merge_fields(
            &mut fields,
            class
                .fields
                .iter()
                .map(|field| (field.schema_name.clone(), field)),
        );
        fields
    }

    /// Last non-abstract field resolver bound to the field's declaring type.
    /// Inherited copies precede the subclass's own records, so a redeclared
    /// resolver shadows the inherited one. External resolvers only count
    /// when their class is part of the schema.
    fn field_resolver(&self, field: &FieldMetadata) -> Option<&'a FieldResolverMetadata> {
        self.storage.field_resolvers().iter().rfind(|resolver| {
            !resolver.base.is_abstract()
                && (resolver.kind == FieldResolverKind::Internal
                    || self.context.includes_resolver(resolver.base.target))
                && resolver.base.method_name == field.name
                && resolver
                    .get_object_type
                    .as_ref()
                    .is_some_and(|object_type| object_type.get() == field.target)
        })
    }

    fn object_field(&self, object: &ClassMetadata, field: &'a FieldMetadata) -> Result<FieldSpec> {
        let mut member = MemberSource::property(field, &object.name);
        if let Some(resolver) = self.field_resolver(field) {
            let base = &resolver.base;
            member.params = &base.params;
            member.roles = base.roles.as_deref();
            member.middlewares = &base.middlewares;
            member.resolve = Resolve::Handler {
                resolver_class: base.resolver_class.as_ref(),
                handler: &base.handler,
            };
        }
        self.field(&object.name, member)
    }

    pub fn build_object(&self, class: &'a ClassMetadata) -> Result<Object> {
        let mut object = Object::new(&class.name);
        if let Some(description) = &class.description {
            object = object.description(description);
        }

        for interface in self.searcher.object_interfaces(self.info, class) {
            if let Some(info) = self.info.find_interface(interface) {
                object = object.implement(&info.metadata.name);
            }
        }

        let fields = self.object_field_metadata(class);
        let field_count = fields.len();
        for field in fields.into_values() {
            object = object.field(self.object_field(class, field)?.into_field());
        }
        trace!(object_type = %class.name, fields = field_count, "Built object type");
        Ok(object)
    }
}

use async_graphql::dynamic::Interface;
use indexmap::IndexMap;
use tracing::trace;

use super::TypeBuilder;
use crate::error::Result;
use crate::metadata::{ClassMetadata, FieldMetadata};
use crate::schema::field_spec::merge_fields;
use crate::schema::types_info::InterfaceTypeInfo;

impl<'a> TypeBuilder<'_, 'a> {
    /// Fields of an interface keyed by schema name. Fields of the parent
    /// interface come first and are overridden by redeclared ones.
    pub(super) fn interface_field_metadata(
        &self,
        class: &'a ClassMetadata,
    ) -> IndexMap<String, &'a FieldMetadata> {
        let mut fields = self
            .searcher
            .interface_type(self.info, class)
            .map(|parent| self.interface_field_metadata(parent))
            .unwrap_or_default();
        merge_fields(
            &mut fields,
            class
                .fields
                .iter()
                .map(|field| (field.schema_name.clone(), field)),
        );
        fields
    }

    pub fn build_interface(&self, info: &InterfaceTypeInfo<'a>) -> Result<Interface> {
        let metadata = info.metadata;
        let mut interface = Interface::new(&metadata.name);
        if let Some(description) = &metadata.description {
            interface = interface.description(description);
        }

        let fields = self.property_fields(
            &metadata.name,
            self.interface_field_metadata(metadata).into_values(),
        )?;
        let field_count = fields.len();
        for spec in fields.into_values() {
            interface = interface.field(spec.into_interface_field());
        }
        trace!(interface = %metadata.name, fields = field_count, "Built interface type");
        Ok(interface)
    }
}

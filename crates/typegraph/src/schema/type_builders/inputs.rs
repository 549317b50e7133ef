use async_graphql::dynamic::InputObject;
use indexmap::IndexMap;
use tracing::trace;

use super::TypeBuilder;
use crate::error::Result;
use crate::metadata::ClassMetadata;
use crate::schema::default_value::resolve_default_value;
use crate::schema::field_spec::{ArgSpec, merge_fields};

impl<'a> TypeBuilder<'_, 'a> {
    /// Input fields keyed by schema name, the registered supertype's first.
    fn input_fields(&self, class: &'a ClassMetadata) -> Result<IndexMap<String, ArgSpec>> {
        let mut fields = match self.searcher.input_type(self.info, class) {
            Some(parent) => self.input_fields(parent)?,
            None => IndexMap::new(),
        };

        let instance_defaults = class.create_instance_defaults();
        for field in &class.fields {
            let owner = format!("{}.{}", class.name, field.name);
            let input = self
                .types
                .input_type(&owner, field.get_type.get(), &field.type_options)?;
            let default_value =
                resolve_default_value(&instance_defaults, &field.type_options, &field.name, &class.name)?
                    .map(|value| input.schema_default(value));
            merge_fields(
                &mut fields,
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
        Ok(fields)
    }

    pub fn build_input(&self, class: &'a ClassMetadata) -> Result<InputObject> {
        let mut input = InputObject::new(&class.name);
        if let Some(description) = &class.description {
            input = input.description(description);
        }

        let fields = self.input_fields(class)?;
        let field_count = fields.len();
        for field in fields.into_values() {
            input = input.field(field.into_input_value());
        }
        trace!(input_type = %class.name, fields = field_count, "Built input type");
        Ok(input)
    }
}

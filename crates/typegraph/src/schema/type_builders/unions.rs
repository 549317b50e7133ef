use async_graphql::dynamic::Union;
use tracing::trace;

use super::TypeBuilder;
use crate::error::{Result, SchemaError};
use crate::schema::types_info::UnionTypeInfo;

impl TypeBuilder<'_, '_> {
    pub fn build_union(&self, info: &UnionTypeInfo<'_>) -> Result<Union> {
        let metadata = info.metadata;
        let mut union = Union::new(&metadata.name);
        if let Some(description) = &metadata.description {
            union = union.description(description);
        }
        for member in &metadata.types {
            let object = self
                .info
                .find_object(*member)
                .ok_or_else(|| SchemaError::unresolvable_output(&metadata.name))?;
            union = union.possible_type(&object.name);
        }
        trace!(union = %metadata.name, members = metadata.types.len(), "Built union type");
        Ok(union)
    }
}

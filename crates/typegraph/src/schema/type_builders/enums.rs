use async_graphql::dynamic::{Enum, EnumItem};
use tracing::trace;

use super::TypeBuilder;
use crate::schema::types_info::EnumTypeInfo;

impl TypeBuilder<'_, '_> {
    pub fn build_enum(&self, info: &EnumTypeInfo<'_>) -> Enum {
        let metadata = info.metadata;
        let mut enum_type = Enum::new(&metadata.name);
        if let Some(description) = &metadata.description {
            enum_type = enum_type.description(description);
        }
        for name in metadata.values.keys() {
            enum_type = enum_type.item(EnumItem::new(name));
        }
        trace!(enum_type = %metadata.name, items = metadata.values.len(), "Built enum type");
        enum_type
    }
}

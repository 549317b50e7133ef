use super::MemberLinks;
use crate::metadata::definitions::{ClassMetadata, FieldMetadata};
use crate::metadata::storage::TargetSpecificStorage;

/// Attaches linked field records to object, input, args and interface classes.
pub(crate) struct ClassMetadataBuilder<'a> {
    pub links: MemberLinks<'a>,
}

impl ClassMetadataBuilder<'_> {
    pub fn build(&self, def: &mut ClassMetadata, fields: &mut TargetSpecificStorage<FieldMetadata>) {
        def.fields = fields
            .iter_mut()
            .filter(|field| field.target == def.target)
            .map(|field| {
                field.roles = self.links.roles(field.target, &field.name);
                field.params = self.links.params(field.target, &field.name);
                field.middlewares = self.links.middlewares(field.target, &field.name);
                field.clone()
            })
            .collect();
    }
}

use super::MemberLinks;
use crate::error::{Result, SchemaError};
use crate::metadata::classes::ClassTable;
use crate::metadata::definitions::{ResolverClassMetadata, ResolverMetadata};
use crate::metadata::storage::TargetSpecificStorage;

/// Links a handler to its resolver class, parameters, roles and middlewares.
pub(crate) struct BaseResolverMetadataBuilder<'a> {
    pub links: MemberLinks<'a>,
    pub resolver_classes: &'a TargetSpecificStorage<ResolverClassMetadata>,
    pub classes: &'a ClassTable,
}

impl BaseResolverMetadataBuilder<'_> {
    /// Links a handler declared on a resolver class.
    pub fn build(&self, def: &mut ResolverMetadata) -> Result<()> {
        let Some(resolver_class) = self.resolver_classes.find(def.target) else {
            return Err(SchemaError::UnknownResolverClass {
                class_name: self.classes.name(def.target),
                method_name: def.method_name.clone(),
            });
        };
        def.resolver_class = Some(resolver_class.clone());
        self.link_members(def);
        Ok(())
    }

    /// Links a handler that may live outside any resolver class.
    pub fn build_detached(&self, def: &mut ResolverMetadata) {
        def.resolver_class = self.resolver_classes.find(def.target).cloned();
        self.link_members(def);
    }

    fn link_members(&self, def: &mut ResolverMetadata) {
        def.params = self.links.params(def.target, &def.method_name);
        def.roles = self.links.roles(def.target, &def.method_name);
        def.middlewares = self.links.middlewares(def.target, &def.method_name);
    }
}

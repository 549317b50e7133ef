//! Builders cross-linking raw metadata records.
//!
//! Each builder borrows exactly the storages it reads or updates, so the
//! registry can run them over disjoint parts of itself.

mod base_resolver;
mod class;
mod field_resolver;
mod resolver_class;

pub(crate) use base_resolver::BaseResolverMetadataBuilder;
pub(crate) use class::ClassMetadataBuilder;
pub(crate) use field_resolver::FieldResolverMetadataBuilder;
pub(crate) use resolver_class::{HandlerStorages, ResolverClassMetadataBuilder};

use std::sync::Arc;

use super::classes::TargetId;
use super::definitions::{AuthorizedMetadata, MiddlewareMetadata, ParamMetadata};
use super::storage::TargetSpecificStorage;
use crate::resolvers::middleware::flatten_middlewares;
use crate::resolvers::{Middleware, Role};

/// Lookups of everything attached to a `(class, member)` pair.
#[derive(Clone, Copy)]
pub(crate) struct MemberLinks<'a> {
    pub params: &'a TargetSpecificStorage<ParamMetadata>,
    pub authorized: &'a TargetSpecificStorage<AuthorizedMetadata>,
    pub middlewares: &'a TargetSpecificStorage<MiddlewareMetadata>,
}

impl MemberLinks<'_> {
    /// Parameters of a member, ordered by their position in the signature.
    pub fn params(&self, target: TargetId, member: &str) -> Vec<ParamMetadata> {
        let mut params: Vec<_> = self
            .params
            .find_many_for_member(target, member)
            .cloned()
            .collect();
        params.sort_by_key(|param| param.index);
        params
    }

    /// Roles of a member; `None` means unguarded.
    pub fn roles(&self, target: TargetId, member: &str) -> Option<Vec<Role>> {
        self.authorized
            .find_member(target, member)
            .map(|authorized| authorized.roles.clone())
    }

    pub fn middlewares(&self, target: TargetId, member: &str) -> Vec<Arc<dyn Middleware>> {
        flatten_middlewares(
            self.middlewares
                .find_many_for_member(target, member)
                .map(|record| record.middlewares.as_slice()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ClassTable, ParamKind};

    #[test]
    fn test_params_are_ordered_by_index() {
        let mut classes = ClassTable::new();
        let resolver = classes.declare("BookResolver", None);

        let mut params = TargetSpecificStorage::new();
        params.collect(ParamMetadata::new(resolver, "books", 1, ParamKind::Info));
        params.collect(ParamMetadata::new(resolver, "books", 0, ParamKind::Context));
        params.collect(ParamMetadata::new(resolver, "other", 0, ParamKind::Info));
        let authorized = TargetSpecificStorage::new();
        let middlewares = TargetSpecificStorage::new();
        let links = MemberLinks {
            params: &params,
            authorized: &authorized,
            middlewares: &middlewares,
        };

        let linked = links.params(resolver, "books");
        assert_eq!(linked.len(), 2);
        assert!(matches!(linked[0].kind, ParamKind::Context));
        assert!(matches!(linked[1].kind, ParamKind::Info));
        assert!(links.roles(resolver, "books").is_none());
        assert!(links.middlewares(resolver, "books").is_empty());
    }
}

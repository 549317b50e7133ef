//! Declaration metadata: records, storages, builders and the registry owning them.

mod builders;
mod classes;
mod definitions;
mod registry;
mod storage;

pub use classes::{Ancestors, ClassTable, EnumId, TargetId, UnionId};
pub use definitions::{
    AuthorizedMetadata, ClassMetadata, EnumMetadata, FieldMetadata, FieldResolverKind,
    FieldResolverMetadata, Member, MiddlewareMetadata, Owned, ParamKind, ParamMetadata,
    ResolverClassMetadata, ResolverMetadata, SubscriptionResolverMetadata, UnionMetadata,
};
pub use registry::{MetadataStorage, default_metadata_storage};
pub use storage::TargetSpecificStorage;

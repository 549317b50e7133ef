//! Resolver class instantiation.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::trace;

use super::ResolverData;
use crate::metadata::{ResolverClassMetadata, TargetId};

/// Supplies the resolver class instance a handler is invoked on.
#[async_trait]
pub trait ResolverContainer: Send + Sync {
    async fn get(
        &self,
        class: &ResolverClassMetadata,
        data: &ResolverData,
    ) -> async_graphql::Result<Arc<dyn Any + Send + Sync>>;
}

/// Container keeping one instance per resolver class.
///
/// Instances are created on first use from the class factory; classes
/// registered without a factory share a unit instance.
#[derive(Default)]
pub struct DefaultContainer {
    instances: DashMap<TargetId, Arc<dyn Any + Send + Sync>>,
}

impl DefaultContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of instantiated resolver classes.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[async_trait]
impl ResolverContainer for DefaultContainer {
    async fn get(
        &self,
        class: &ResolverClassMetadata,
        _data: &ResolverData,
    ) -> async_graphql::Result<Arc<dyn Any + Send + Sync>> {
        let instance = self
            .instances
            .entry(class.target)
            .or_insert_with(|| {
                trace!(target_id = %class.target, "Instantiating resolver class");
                class.instantiate()
            })
            .clone();
        Ok(instance)
    }
}

//! Lazy schema loading implementation.
//!
//! This module provides `LazySchema`, a thread-safe wrapper that defers schema
//! building until first access. Each build collects declarations into a
//! fresh registry, so the schema can be rebuilt after `invalidate()`.

use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::Schema;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::build_context::BuildSchemaOptions;
use super::builder::build_schema;
use crate::error::{Result, SchemaError};
use crate::metadata::MetadataStorage;

/// State of the lazy schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    /// Schema has not been built yet.
    Uninitialized,
    /// Schema is currently being built.
    Building,
    /// Schema is ready for use.
    Ready,
    /// Schema build failed.
    Failed,
}

type DeclareFn = Arc<dyn Fn(&mut MetadataStorage) -> BuildSchemaOptions + Send + Sync>;

/// Thread-safe lazy schema holder.
///
/// The declaration function populates an empty registry and returns the
/// build options referencing the classes it declared.
///
/// # Example
///
/// ```ignore
/// let lazy_schema = LazySchema::new(|storage| {
///     let resolver = declare_book_resolver(storage);
///     BuildSchemaOptions::new([resolver])
/// });
///
/// // First access triggers build
/// let schema = lazy_schema.get_or_build().await?;
///
/// // Force rebuild on next access
/// lazy_schema.invalidate().await;
/// ```
pub struct LazySchema {
    /// The cached schema (None if not built yet or invalidated).
    schema: RwLock<Option<Arc<Schema>>>,

    /// Build lock to ensure only one build at a time.
    build_lock: Mutex<()>,

    state: RwLock<SchemaState>,

    declare: DeclareFn,

    /// Last build error (for diagnostics).
    last_error: RwLock<Option<SchemaError>>,
}

impl LazySchema {
    #[must_use]
    pub fn new<F>(declare: F) -> Self
    where
        F: Fn(&mut MetadataStorage) -> BuildSchemaOptions + Send + Sync + 'static,
    {
        Self {
            schema: RwLock::new(None),
            build_lock: Mutex::new(()),
            state: RwLock::new(SchemaState::Uninitialized),
            declare: Arc::new(declare),
            last_error: RwLock::new(None),
        }
    }

    /// Returns the current state of the schema.
    pub async fn state(&self) -> SchemaState {
        *self.state.read().await
    }

    /// Gets the schema, building it if necessary.
    ///
    /// Concurrent callers receive `SchemaInitializing` while a build is in
    /// progress; use `get_or_build_wait()` to wait instead.
    ///
    /// # Errors
    ///
    /// Returns `SchemaInitializing` if another build is in progress, or the
    /// build error.
    pub async fn get_or_build(&self) -> Result<Arc<Schema>> {
        if let Some(schema) = self.get().await {
            return Ok(schema);
        }

        if *self.state.read().await == SchemaState::Building {
            return Err(SchemaError::SchemaInitializing);
        }

        let Ok(_guard) = self.build_lock.try_lock() else {
            return Err(SchemaError::SchemaInitializing);
        };

        // Double-check after acquiring lock
        if let Some(schema) = self.get().await {
            return Ok(schema);
        }

        self.build().await
    }

    /// Gets the schema, waiting for an in-progress build to complete.
    ///
    /// A failed build is not retried until `invalidate()` is called.
    ///
    /// # Errors
    ///
    /// Returns the build error.
    pub async fn get_or_build_wait(&self) -> Result<Arc<Schema>> {
        if let Some(schema) = self.get().await {
            return Ok(schema);
        }

        let _guard = self.build_lock.lock().await;

        if let Some(schema) = self.get().await {
            return Ok(schema);
        }

        if *self.state.read().await == SchemaState::Failed {
            if let Some(err) = self.last_error.read().await.as_ref() {
                return Err(err.clone());
            }
        }

        self.build().await
    }

    /// Runs a build. The caller holds the build lock.
    async fn build(&self) -> Result<Arc<Schema>> {
        *self.state.write().await = SchemaState::Building;
        info!("Building GraphQL schema...");

        let mut storage = MetadataStorage::new();
        let options = (self.declare)(&mut storage);
        match build_schema(&mut storage, options).await {
            Ok(schema) => {
                let schema = Arc::new(schema);
                *self.schema.write().await = Some(Arc::clone(&schema));
                *self.state.write().await = SchemaState::Ready;
                *self.last_error.write().await = None;
                info!("GraphQL schema built successfully");
                Ok(schema)
            }
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "Failed to build GraphQL schema");
                *self.state.write().await = SchemaState::Failed;
                *self.last_error.write().await = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Gets the schema if it's already built, without triggering a build.
    pub async fn get(&self) -> Option<Arc<Schema>> {
        self.schema.read().await.clone()
    }

    /// Invalidates the cached schema, causing the next `get_or_build()`
    /// to rebuild it.
    pub async fn invalidate(&self) {
        let _guard = self.build_lock.lock().await;

        *self.schema.write().await = None;
        *self.state.write().await = SchemaState::Uninitialized;
        *self.last_error.write().await = None;

        info!("GraphQL schema invalidated - will rebuild on next request");
    }

    /// Returns the last build error, if any.
    pub async fn last_error(&self) -> Option<SchemaError> {
        self.last_error.read().await.clone()
    }

    /// Returns whether the schema is ready for use.
    pub async fn is_ready(&self) -> bool {
        *self.state.read().await == SchemaState::Ready
    }
}

impl fmt::Debug for LazySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySchema").finish_non_exhaustive()
    }
}

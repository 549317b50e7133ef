//! Options and settings shared by one schema build.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::SchemaConfig;
use crate::error::{Result, SchemaError};
use crate::metadata::{MetadataStorage, TargetId};
use crate::resolvers::{
    AuthChecker, AuthMode, DefaultContainer, InputValidator, Middleware, ResolverContainer,
    ResolverSettings,
};
use crate::subscriptions::{PubSub, PubSubEngine};
use crate::types::{DateScalarMode, ScalarDefinition, ScalarsMap};

/// Options accepted by [`build_schema`](crate::build_schema).
///
/// # Example
///
/// ```ignore
/// let options = BuildSchemaOptions::new([book_resolver])
///     .auth_checker(Arc::new(RoleChecker))
///     .scalar(ScalarDefinition::new("Email"));
/// let schema = build_schema(&mut storage, options).await?;
/// ```
#[derive(Clone)]
pub struct BuildSchemaOptions {
    /// Resolver classes making up the schema. Must not be empty.
    pub resolvers: Vec<TargetId>,
    pub config: SchemaConfig,
    pub scalars_map: ScalarsMap,
    pub auth_checker: Option<Arc<dyn AuthChecker>>,
    pub pub_sub: Option<Arc<dyn PubSubEngine>>,
    pub global_middlewares: Vec<Arc<dyn Middleware>>,
    pub container: Option<Arc<dyn ResolverContainer>>,
    pub validator: Option<Arc<dyn InputValidator>>,
}

impl BuildSchemaOptions {
    pub fn new(resolvers: impl IntoIterator<Item = TargetId>) -> Self {
        Self {
            resolvers: resolvers.into_iter().collect(),
            config: SchemaConfig::default(),
            scalars_map: ScalarsMap::new(),
            auth_checker: None,
            pub_sub: None,
            global_middlewares: Vec::new(),
            container: None,
            validator: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: SchemaConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn date_scalar_mode(mut self, mode: DateScalarMode) -> Self {
        self.config.date_scalar_mode = mode;
        self
    }

    /// Registers a custom scalar.
    #[must_use]
    pub fn scalar(mut self, definition: ScalarDefinition) -> Self {
        self.scalars_map.insert(definition);
        self
    }

    #[must_use]
    pub fn scalars_map(mut self, scalars_map: ScalarsMap) -> Self {
        self.scalars_map = scalars_map;
        self
    }

    #[must_use]
    pub fn auth_checker(mut self, checker: Arc<dyn AuthChecker>) -> Self {
        self.auth_checker = Some(checker);
        self
    }

    #[must_use]
    pub fn auth_mode(mut self, mode: AuthMode) -> Self {
        self.config.auth_mode = mode;
        self
    }

    #[must_use]
    pub fn pub_sub(mut self, pub_sub: Arc<dyn PubSubEngine>) -> Self {
        self.pub_sub = Some(pub_sub);
        self
    }

    /// Appends a middleware run for every field, after auth.
    #[must_use]
    pub fn global_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.global_middlewares.push(middleware);
        self
    }

    #[must_use]
    pub fn container(mut self, container: Arc<dyn ResolverContainer>) -> Self {
        self.container = Some(container);
        self
    }

    /// Sets the validator run on input and args parameters.
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn InputValidator>) -> Self {
        self.validator = Some(validator);
        self
    }
}

impl fmt::Debug for BuildSchemaOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildSchemaOptions")
            .field("resolvers", &self.resolvers)
            .field("config", &self.config)
            .field("scalars_map", &self.scalars_map)
            .field("has_auth_checker", &self.auth_checker.is_some())
            .field("global_middlewares", &self.global_middlewares)
            .finish_non_exhaustive()
    }
}

/// Settings of a single schema build, resolved from [`BuildSchemaOptions`].
pub struct BuildContext {
    /// Resolver classes whose handlers make it into the schema.
    pub(crate) resolvers: HashSet<TargetId>,
    pub(crate) config: SchemaConfig,
    pub(crate) scalars_map: ScalarsMap,
    pub(crate) pub_sub: Arc<dyn PubSubEngine>,
    pub(crate) settings: ResolverSettings,
}

impl BuildContext {
    /// Resolves the options against the registry they will build.
    ///
    /// # Errors
    ///
    /// Returns `MissingAuthChecker` when roles were declared but no checker
    /// was supplied.
    pub fn create(options: BuildSchemaOptions, storage: &MetadataStorage) -> Result<Self> {
        if !storage.authorized_fields().is_empty() && options.auth_checker.is_none() {
            return Err(SchemaError::MissingAuthChecker);
        }
        options.config.validate().map_err(SchemaError::InvalidConfig)?;

        let container = options
            .container
            .unwrap_or_else(|| Arc::new(DefaultContainer::new()));
        let pub_sub = options.pub_sub.unwrap_or_else(|| Arc::new(PubSub::new()));
        debug!(
            resolvers = options.resolvers.len(),
            scalars = options.scalars_map.iter().count(),
            global_middlewares = options.global_middlewares.len(),
            "Created build context"
        );

        Ok(Self {
            resolvers: options.resolvers.into_iter().collect(),
            settings: ResolverSettings {
                container,
                auth_checker: options.auth_checker,
                auth_mode: options.config.auth_mode,
                global_middlewares: options.global_middlewares,
                validator: options.validator,
            },
            config: options.config,
            scalars_map: options.scalars_map,
            pub_sub,
        })
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// Returns whether handlers owned by `target` are part of the schema.
    pub fn includes_resolver(&self, target: TargetId) -> bool {
        self.resolvers.contains(&target)
    }

    pub fn date_scalar_mode(&self) -> DateScalarMode {
        self.config.date_scalar_mode
    }

    pub fn scalars_map(&self) -> &ScalarsMap {
        &self.scalars_map
    }

    /// Engine delivering subscription payloads.
    pub fn pub_sub(&self) -> &Arc<dyn PubSubEngine> {
        &self.pub_sub
    }
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("config", &self.config)
            .field("scalars_map", &self.scalars_map)
            .finish_non_exhaustive()
    }
}

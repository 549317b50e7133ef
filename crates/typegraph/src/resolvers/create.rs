//! Per-field runtime assembled during schema generation.
//!
//! Every generated field (root handler, field resolver or plain property)
//! owns a [`FieldRuntime`]. Resolving the field runs:
//!
//! 1. Enum argument conversion to internal values
//! 2. The middleware chain (auth first, then global, then member middlewares)
//! 3. The endpoint: a handler invocation or a property read on the parent
//! 4. Output conversion into an engine field value

use std::sync::Arc;

use async_graphql::dynamic::{FieldFuture, ResolverContext};
use async_graphql::indexmap::IndexMap;
use async_graphql::{Name, Value};
use futures_util::future::BoxFuture;
use tracing::trace;

use super::auth::AuthMiddleware;
use super::convert::{EnumMapping, OutputKind};
use super::{
    AuthChecker, AuthMode, HandlerCall, HandlerFn, HandlerResult, InputValidator, Middleware, Next,
    ParamValue, RequestContext, ResolveInfo, ResolvedValue, ResolverContainer, ResolverData, Role,
};
use crate::metadata::ResolverClassMetadata;

/// Build-wide resolution settings shared by every field runtime.
#[derive(Clone)]
pub(crate) struct ResolverSettings {
    pub container: Arc<dyn ResolverContainer>,
    pub auth_checker: Option<Arc<dyn AuthChecker>>,
    pub auth_mode: AuthMode,
    pub global_middlewares: Vec<Arc<dyn Middleware>>,
    pub validator: Option<Arc<dyn InputValidator>>,
}

impl ResolverSettings {
    /// Assembles the chain of a member: auth, global, then its own middlewares.
    pub fn middleware_chain(
        &self,
        roles: Option<&[Role]>,
        own: &[Arc<dyn Middleware>],
    ) -> Vec<Arc<dyn Middleware>> {
        let mut chain: Vec<Arc<dyn Middleware>> =
            Vec::with_capacity(1 + self.global_middlewares.len() + own.len());
        if let (Some(checker), Some(roles)) = (&self.auth_checker, roles) {
            chain.push(Arc::new(AuthMiddleware::new(
                Arc::clone(checker),
                self.auth_mode,
                roles.to_vec(),
            )));
        }
        chain.extend(self.global_middlewares.iter().cloned());
        chain.extend(own.iter().cloned());
        chain
    }
}

/// Handler parameter resolved at invocation.
#[derive(Debug, Clone)]
pub(crate) enum PreparedParam {
    /// `validate_as` names the input type to validate against, if any.
    Arg {
        name: String,
        validate_as: Option<String>,
    },
    Args {
        validate_as: Option<String>,
    },
    Context,
    Info,
    Root {
        property: Option<String>,
    },
}

/// What produces the raw value of a field.
#[derive(Debug, Clone)]
pub(crate) enum Endpoint {
    Handler {
        /// `None` for field resolvers declared on the object type itself.
        resolver_class: Option<ResolverClassMetadata>,
        handler: HandlerFn,
        params: Vec<PreparedParam>,
    },
    /// Reads a property of the parent value.
    Property(String),
}

/// Enum argument mapped to internal values before resolution.
#[derive(Debug, Clone)]
pub(crate) struct ArgConversion {
    pub name: Name,
    pub mapping: Arc<EnumMapping>,
}

pub(crate) struct FieldRuntime {
    pub info: ResolveInfo,
    pub endpoint: Endpoint,
    pub middlewares: Vec<Arc<dyn Middleware>>,
    pub arg_conversions: Vec<ArgConversion>,
    pub output: OutputKind,
    pub settings: ResolverSettings,
}

impl FieldRuntime {
    /// Maps enum arguments to their internal values.
    pub fn prepare_args(&self, args: IndexMap<Name, Value>) -> IndexMap<Name, Value> {
        let mut args = args;
        for conversion in &self.arg_conversions {
            if let Some(value) = args.get_mut(&conversion.name) {
                *value = conversion.mapping.to_internal(value);
            }
        }
        args
    }

    /// Runs the middleware chain and the endpoint for one invocation.
    pub async fn resolve(
        &self,
        root: ResolvedValue,
        args: IndexMap<Name, Value>,
        context: Option<RequestContext>,
    ) -> HandlerResult {
        let data = ResolverData {
            root,
            args: self.prepare_args(args),
            context,
            info: self.info.clone(),
        };
        trace!(
            field = %self.info.field_name,
            parent = %self.info.parent_type,
            middlewares = self.middlewares.len(),
            "Resolving field"
        );

        let endpoint = || {
            let future: BoxFuture<'_, HandlerResult> = Box::pin(self.call_endpoint(&data));
            future
        };
        Next::new(&self.middlewares, &data, &endpoint).run().await
    }

    async fn call_endpoint(&self, data: &ResolverData) -> HandlerResult {
        match &self.endpoint {
            Endpoint::Property(name) => Ok(data.root.property(name)),
            Endpoint::Handler {
                resolver_class,
                handler,
                params,
            } => {
                let instance = match resolver_class {
                    Some(class) => Some(self.settings.container.get(class, data).await?),
                    None => None,
                };
                let mut values = Vec::with_capacity(params.len());
                for param in params {
                    values.push(self.param_value(param, data).await?);
                }
                handler
                    .call(HandlerCall {
                        instance,
                        data: data.clone(),
                        params: values,
                    })
                    .await
            }
        }
    }

    async fn param_value(
        &self,
        param: &PreparedParam,
        data: &ResolverData,
    ) -> async_graphql::Result<ParamValue> {
        Ok(match param {
            PreparedParam::Arg { name, validate_as } => {
                let value = data.arg(name).cloned().unwrap_or(Value::Null);
                self.validate(validate_as.as_deref(), &value).await?;
                ParamValue::Arg(value)
            }
            PreparedParam::Args { validate_as } => {
                let value = Value::Object(data.args.clone());
                self.validate(validate_as.as_deref(), &value).await?;
                ParamValue::Args(value)
            }
            PreparedParam::Context => ParamValue::Context(data.context.clone()),
            PreparedParam::Info => ParamValue::Info(data.info.clone()),
            PreparedParam::Root { property } => ParamValue::Root(match property {
                Some(property) => data.root.property(property),
                None => data.root.clone(),
            }),
        })
    }

    async fn validate(&self, type_name: Option<&str>, value: &Value) -> async_graphql::Result<()> {
        match (&self.settings.validator, type_name) {
            (Some(validator), Some(type_name)) if !matches!(value, Value::Null) => {
                validator.validate(type_name, value).await
            }
            _ => Ok(()),
        }
    }

    /// Creates the engine resolver function of the field.
    pub fn resolver(
        self: Arc<Self>,
    ) -> impl Fn(ResolverContext<'_>) -> FieldFuture<'_> + Send + Sync + 'static {
        move |ctx| {
            let runtime = Arc::clone(&self);
            FieldFuture::new(async move {
                let root = ctx
                    .parent_value
                    .try_downcast_ref::<ResolvedValue>()
                    .ok()
                    .cloned()
                    .unwrap_or_default();
                let args = arguments(&ctx);
                let context = ctx.data_opt::<RequestContext>().cloned();

                let value = runtime.resolve(root, args, context).await?;
                runtime.output.to_field_value(value)
            })
        }
    }
}

/// Collects the arguments of a field invocation.
pub(crate) fn arguments(ctx: &ResolverContext<'_>) -> IndexMap<Name, Value> {
    ctx.args
        .iter()
        .map(|(name, value)| (name.clone(), value.as_value().clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ClassTable, EnumId, EnumMetadata};
    use crate::resolvers::{DefaultContainer, Instance, handler};
    use async_trait::async_trait;

    fn settings() -> ResolverSettings {
        ResolverSettings {
            container: Arc::new(DefaultContainer::new()),
            auth_checker: None,
            auth_mode: AuthMode::Error,
            global_middlewares: Vec::new(),
            validator: None,
        }
    }

    fn info() -> ResolveInfo {
        ResolveInfo {
            field_name: "title".into(),
            parent_type: "Book".into(),
            return_type: "String!".into(),
        }
    }

    fn runtime(endpoint: Endpoint, settings: ResolverSettings) -> FieldRuntime {
        FieldRuntime {
            info: info(),
            endpoint,
            middlewares: Vec::new(),
            arg_conversions: Vec::new(),
            output: OutputKind::Leaf,
            settings,
        }
    }

    #[tokio::test]
    async fn test_property_endpoint_reads_parent() {
        let mut classes = ClassTable::new();
        let book = classes.declare("Book", None);
        let runtime = runtime(Endpoint::Property("title".into()), settings());

        let root = Instance::new(book).with("title", "Dune").into();
        let value = runtime.resolve(root, IndexMap::new(), None).await;
        assert_eq!(value.ok(), Some(ResolvedValue::from("Dune")));
    }

    #[tokio::test]
    async fn test_handler_receives_params_in_order() {
        let mut classes = ClassTable::new();
        let resolver = classes.declare("BookResolver", None);
        let endpoint = Endpoint::Handler {
            resolver_class: Some(ResolverClassMetadata::new(resolver)),
            handler: handler(|call: HandlerCall| async move {
                let title = call.param(0).cloned().unwrap_or(Value::Null);
                let has_info = matches!(call.params.get(1), Some(ParamValue::Info(_)));
                assert!(call.instance::<()>().is_some());
                Ok(ResolvedValue::list([ResolvedValue::Value(title), has_info.into()]))
            }),
            params: vec![
                PreparedParam::Arg {
                    name: "title".into(),
                    validate_as: None,
                },
                PreparedParam::Info,
            ],
        };
        let runtime = runtime(endpoint, settings());

        let args = [(Name::new("title"), Value::from("Emma"))].into_iter().collect();
        let value = runtime.resolve(ResolvedValue::Null, args, None).await;
        assert_eq!(
            value.ok(),
            Some(ResolvedValue::list([ResolvedValue::from("Emma"), true.into()]))
        );
    }

    #[tokio::test]
    async fn test_enum_arguments_are_converted() {
        let mapping = Arc::new(EnumMapping::new(&EnumMetadata {
            id: EnumId(0),
            name: "Color".into(),
            description: None,
            values: [("RED".to_string(), Value::from(1))].into_iter().collect(),
        }));
        let mut runtime = runtime(
            Endpoint::Handler {
                resolver_class: None,
                handler: handler(|call: HandlerCall| async move {
                    Ok(ResolvedValue::Value(call.data.arg("color").cloned().unwrap_or(Value::Null)))
                }),
                params: Vec::new(),
            },
            settings(),
        );
        runtime.arg_conversions.push(ArgConversion {
            name: Name::new("color"),
            mapping,
        });

        let args = [(Name::new("color"), Value::Enum(Name::new("RED")))]
            .into_iter()
            .collect();
        let value = runtime.resolve(ResolvedValue::Null, args, None).await;
        assert_eq!(value.ok(), Some(ResolvedValue::from(1)));
    }

    struct RejectAll;

    #[async_trait]
    impl InputValidator for RejectAll {
        async fn validate(&self, type_name: &str, _value: &Value) -> async_graphql::Result<()> {
            Err(async_graphql::Error::new(format!("invalid {type_name}")))
        }
    }

    #[tokio::test]
    async fn test_validator_runs_for_input_params() {
        let mut settings = settings();
        settings.validator = Some(Arc::new(RejectAll));
        let runtime = runtime(
            Endpoint::Handler {
                resolver_class: None,
                handler: handler(|_call: HandlerCall| async { Ok(ResolvedValue::Null) }),
                params: vec![PreparedParam::Args {
                    validate_as: Some("BookArgs".into()),
                }],
            },
            settings,
        );

        let err = runtime
            .resolve(ResolvedValue::Null, IndexMap::new(), None)
            .await
            .expect_err("validation fails");
        assert_eq!(err.message, "invalid BookArgs");
    }
}

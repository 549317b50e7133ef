//! Subscription field definitions.

use std::sync::Arc;

use async_graphql::dynamic::{FieldValue, SubscriptionField, SubscriptionFieldFuture, TypeRef};
use async_stream::stream;
use futures_util::StreamExt;
use tracing::{debug, trace};

use super::{FilterFn, PubSubEngine, ResolverFilterData, ResolverTopicData, Topics};
use crate::error::SchemaError;
use crate::resolvers::{FieldRuntime, RequestContext, ResolvedValue, arguments};

/// Where the payloads of a subscription field come from.
#[derive(Clone)]
pub(crate) struct SubscriptionSource {
    pub topics: Topics,
    pub filter: Option<FilterFn>,
    pub pubsub: Arc<dyn PubSubEngine>,
    /// Declaring class name, for error messages.
    pub class_name: String,
    pub method_name: String,
}

/// Creates a subscription field streaming the handler result of every
/// payload published under the field's topics.
pub(crate) fn create_subscription_field(
    name: String,
    type_ref: TypeRef,
    runtime: Arc<FieldRuntime>,
    source: SubscriptionSource,
) -> SubscriptionField {
    SubscriptionField::new(name, type_ref, move |ctx| {
        let runtime = Arc::clone(&runtime);
        let source = source.clone();
        let raw_args = arguments(&ctx);
        let args = runtime.prepare_args(raw_args.clone());
        let context = ctx.data_opt::<RequestContext>().cloned();

        SubscriptionFieldFuture::new(async move {
            let topics = source.topics.resolve(&ResolverTopicData {
                args: args.clone(),
                context: context.clone(),
                info: runtime.info.clone(),
            });
            if topics.is_empty() {
                return Err(
                    SchemaError::missing_topics(&source.class_name, &source.method_name)
                        .into_graphql_error(),
                );
            }

            debug!(
                field = %runtime.info.field_name,
                ?topics,
                "Starting subscription"
            );
            let mut payloads = source.pubsub.subscribe(&topics);

            Ok(stream! {
                while let Some(payload) = payloads.next().await {
                    if let Some(filter) = &source.filter {
                        let data = ResolverFilterData {
                            payload: payload.clone(),
                            args: args.clone(),
                            context: context.clone(),
                            info: runtime.info.clone(),
                        };
                        if !filter.call(&data) {
                            trace!(field = %runtime.info.field_name, "Payload filtered");
                            continue;
                        }
                    }

                    let resolved = runtime
                        .resolve(ResolvedValue::Value(payload), raw_args.clone(), context.clone())
                        .await;
                    yield resolved.and_then(|value| {
                        Ok(runtime.output.to_field_value(value)?.unwrap_or(FieldValue::NULL))
                    });
                }
            })
        })
    })
}

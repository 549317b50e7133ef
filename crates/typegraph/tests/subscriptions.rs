//! Integration tests for subscription handlers.

use std::sync::Arc;
use std::time::Duration;

use async_graphql::{Request, Value};
use futures_util::StreamExt;
use serde_json::json;
use typegraph::{
    BuildSchemaOptions, ClassMetadata, FieldMetadata, HandlerCall, MetadataStorage, ParamMetadata,
    PubSub, PubSubEngine, ResolvedValue, ResolverClassMetadata, ResolverMetadata, ScalarType,
    SubscriptionResolverMetadata, TargetId, Topics, TypeFn, TypeOptions, build_schema,
    build_schema_sync, handler, subscriptions::FilterFn,
};

const TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Helpers
// =============================================================================

/// Declares `Notification { message }`, a `ping` query and a resolver
/// class; returns `(notification, resolver)`.
fn declare_notifications(storage: &mut MetadataStorage) -> (TargetId, TargetId) {
    let notification = storage.declare_class("Notification");
    storage.collect_object_metadata(ClassMetadata::new(notification, "Notification"));
    storage.collect_class_field(FieldMetadata::new(
        notification,
        "message",
        TypeFn::of(ScalarType::String),
    ));

    let resolver = storage.declare_class("NotificationResolver");
    storage.collect_resolver_class(ResolverClassMetadata::new(resolver));
    storage.collect_query_handler(ResolverMetadata::new(
        resolver,
        "ping",
        TypeFn::of(ScalarType::Boolean),
        handler(|_call: HandlerCall| async { Ok(ResolvedValue::from(true)) }),
    ));
    (notification, resolver)
}

/// Subscription handler returning the payload as the notification itself.
fn notifications(resolver: TargetId, notification: TargetId, topics: Topics) -> SubscriptionResolverMetadata {
    SubscriptionResolverMetadata::new(
        ResolverMetadata::new(
            resolver,
            "notifications",
            TypeFn::of(notification),
            handler(|call: HandlerCall| async move { Ok(call.data.root.clone()) }),
        ),
        topics,
    )
}

/// Publishes every payload once the subscription is listening.
fn publish_when_subscribed(pubsub: Arc<PubSub>, topic: &'static str, payloads: Vec<Value>) {
    tokio::spawn(async move {
        while pubsub.subscriber_count() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        for payload in payloads {
            pubsub.publish(topic, payload).await;
        }
    });
}

fn message(text: &str) -> Value {
    ResolvedValue::from_json(json!({ "message": text })).into_value()
}

// =============================================================================
// Topics
// =============================================================================

#[tokio::test]
async fn test_static_topic_delivers_published_payloads() {
    let mut storage = MetadataStorage::new();
    let (notification, resolver) = declare_notifications(&mut storage);
    storage.collect_subscription_handler(notifications(resolver, notification, Topics::single("NOTIFICATIONS")));

    let pubsub = Arc::new(PubSub::new());
    let options = BuildSchemaOptions::new([resolver]).pub_sub(pubsub.clone());
    let schema = build_schema(&mut storage, options).await.unwrap();

    let data = schema
        .execute("{ __schema { subscriptionType { name fields { name } } } }")
        .await
        .data
        .into_json()
        .unwrap();
    assert_eq!(
        data["__schema"]["subscriptionType"],
        json!({ "name": "Subscription", "fields": [{ "name": "notifications" }] })
    );

    publish_when_subscribed(
        pubsub.clone(),
        "NOTIFICATIONS",
        vec![message("first"), message("second")],
    );
    let mut stream = schema.execute_stream(Request::new("subscription { notifications { message } }"));

    for expected in ["first", "second"] {
        let response = tokio::time::timeout(TIMEOUT, stream.next())
            .await
            .expect("payload delivered")
            .expect("stream open");
        assert!(response.errors.is_empty(), "unexpected errors: {:?}", response.errors);
        assert_eq!(
            response.data.into_json().unwrap(),
            json!({ "notifications": { "message": expected } })
        );
    }
}

#[tokio::test]
async fn test_filter_drops_rejected_payloads() {
    let mut storage = MetadataStorage::new();
    let (notification, resolver) = declare_notifications(&mut storage);
    storage.collect_subscription_handler(
        notifications(resolver, notification, Topics::many(["ALERTS", "NEWS"])).filter(FilterFn::new(
            |data| match &data.payload {
                Value::Object(payload) => payload.get("message") != Some(&Value::from("spam")),
                _ => false,
            },
        )),
    );

    let pubsub = Arc::new(PubSub::new());
    let options = BuildSchemaOptions::new([resolver]).pub_sub(pubsub.clone());
    let schema = build_schema(&mut storage, options).await.unwrap();

    publish_when_subscribed(pubsub.clone(), "NEWS", vec![message("spam"), message("hello")]);
    let mut stream = schema.execute_stream(Request::new("subscription { notifications { message } }"));

    let response = tokio::time::timeout(TIMEOUT, stream.next())
        .await
        .expect("payload delivered")
        .expect("stream open");
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "notifications": { "message": "hello" } })
    );
}

#[tokio::test]
async fn test_dynamic_topics_use_arguments() {
    let mut storage = MetadataStorage::new();
    let (notification, resolver) = declare_notifications(&mut storage);
    storage.collect_subscription_handler(notifications(
        resolver,
        notification,
        Topics::dynamic(|data| match data.args.get("channel") {
            Some(Value::String(channel)) => vec![format!("CHANNEL_{channel}")],
            _ => Vec::new(),
        }),
    ));
    storage.collect_handler_param(ParamMetadata::arg(
        resolver,
        "notifications",
        0,
        "channel",
        TypeFn::of(ScalarType::String),
        TypeOptions::new(),
    ));

    let pubsub = Arc::new(PubSub::new());
    let options = BuildSchemaOptions::new([resolver]).pub_sub(pubsub.clone());
    let schema = build_schema(&mut storage, options).await.unwrap();

    publish_when_subscribed(pubsub.clone(), "CHANNEL_rust", vec![message("released")]);
    let mut stream = schema.execute_stream(Request::new(
        r#"subscription { notifications(channel: "rust") { message } }"#,
    ));

    let response = tokio::time::timeout(TIMEOUT, stream.next())
        .await
        .expect("payload delivered")
        .expect("stream open");
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({ "notifications": { "message": "released" } })
    );
}

#[tokio::test]
async fn test_empty_dynamic_topics_fail_on_subscribe() {
    let mut storage = MetadataStorage::new();
    let (notification, resolver) = declare_notifications(&mut storage);
    storage.collect_subscription_handler(notifications(resolver, notification, Topics::dynamic(|_| Vec::new())));

    let schema = build_schema(&mut storage, BuildSchemaOptions::new([resolver]))
        .await
        .unwrap();
    let mut stream = schema.execute_stream(Request::new("subscription { notifications { message } }"));

    let response = tokio::time::timeout(TIMEOUT, stream.next())
        .await
        .expect("error delivered")
        .expect("stream open");
    assert_eq!(response.errors.len(), 1);
    assert_eq!(
        response.errors[0].message,
        "Subscription 'NotificationResolver.notifications' doesn't provide any topics to subscribe to"
    );
}

#[test]
fn test_empty_static_topics_fail_the_build() {
    let mut storage = MetadataStorage::new();
    let (notification, resolver) = declare_notifications(&mut storage);
    storage.collect_subscription_handler(notifications(
        resolver,
        notification,
        Topics::many(Vec::<String>::new()),
    ));

    let err = build_schema_sync(&mut storage, BuildSchemaOptions::new([resolver]))
        .expect_err("no topics");
    assert_eq!(err.error_code(), "MISSING_SUBSCRIPTION_TOPICS");
    assert!(err.to_string().contains("NotificationResolver.notifications"));
}

//! Subscription topics, filters and the pub/sub engine delivering payloads.
//!
//! ## Flow
//!
//! 1. Resolving a subscription field computes its topics, statically or from
//!    the invocation arguments and context
//! 2. The field subscribes to those topics on the [`PubSubEngine`]
//! 3. Each payload passing the optional filter becomes the root value the
//!    subscription handler resolves against

mod fields;
mod pubsub;

pub(crate) use fields::{SubscriptionSource, create_subscription_field};
pub use pubsub::{PubSub, PubSubEngine, TopicEvent};

use std::fmt;
use std::sync::Arc;

use async_graphql::indexmap::IndexMap;
use async_graphql::{Name, Value};

use crate::resolvers::{RequestContext, ResolveInfo};

/// Invocation data a dynamic topic function receives.
#[derive(Debug, Clone)]
pub struct ResolverTopicData {
    pub args: IndexMap<Name, Value>,
    pub context: Option<RequestContext>,
    pub info: ResolveInfo,
}

/// Payload plus invocation data a filter receives.
#[derive(Debug, Clone)]
pub struct ResolverFilterData {
    pub payload: Value,
    pub args: IndexMap<Name, Value>,
    pub context: Option<RequestContext>,
    pub info: ResolveInfo,
}

/// Computes topics when a subscription is invoked.
#[derive(Clone)]
pub struct TopicFn(Arc<dyn Fn(&ResolverTopicData) -> Vec<String> + Send + Sync>);

impl TopicFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ResolverTopicData) -> Vec<String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, data: &ResolverTopicData) -> Vec<String> {
        (self.0)(data)
    }
}

impl fmt::Debug for TopicFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TopicFn(..)")
    }
}

/// Decides whether a payload is delivered to a subscriber.
#[derive(Clone)]
pub struct FilterFn(Arc<dyn Fn(&ResolverFilterData) -> bool + Send + Sync>);

impl FilterFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ResolverFilterData) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, data: &ResolverFilterData) -> bool {
        (self.0)(data)
    }
}

impl fmt::Debug for FilterFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FilterFn(..)")
    }
}

/// Topics a subscription listens to.
#[derive(Debug, Clone)]
pub enum Topics {
    Single(String),
    Many(Vec<String>),
    /// Computed per invocation.
    Dynamic(TopicFn),
}

impl Topics {
    pub fn single(topic: impl Into<String>) -> Self {
        Self::Single(topic.into())
    }

    pub fn many<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Many(topics.into_iter().map(Into::into).collect())
    }

    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&ResolverTopicData) -> Vec<String> + Send + Sync + 'static,
    {
        Self::Dynamic(TopicFn::new(f))
    }

    /// Returns whether the topics are known to be empty without invoking
    /// anything.
    pub fn is_statically_empty(&self) -> bool {
        matches!(self, Self::Many(topics) if topics.is_empty())
    }

    /// Resolves the topic list for an invocation.
    pub fn resolve(&self, data: &ResolverTopicData) -> Vec<String> {
        match self {
            Self::Single(topic) => vec![topic.clone()],
            Self::Many(topics) => topics.clone(),
            Self::Dynamic(topic_fn) => topic_fn.call(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic_data(channel: &str) -> ResolverTopicData {
        ResolverTopicData {
            args: [(Name::new("channel"), Value::from(channel))]
                .into_iter()
                .collect(),
            context: None,
            info: ResolveInfo {
                field_name: "messages".into(),
                parent_type: "Subscription".into(),
                return_type: "String!".into(),
            },
        }
    }

    #[test]
    fn test_static_topics() {
        let data = topic_data("general");
        assert_eq!(Topics::single("A").resolve(&data), vec!["A"]);
        assert_eq!(Topics::many(["A", "B"]).resolve(&data), vec!["A", "B"]);
        assert!(Topics::many(Vec::<String>::new()).is_statically_empty());
        assert!(!Topics::single("A").is_statically_empty());
    }

    #[test]
    fn test_dynamic_topics_read_arguments() {
        let topics = Topics::dynamic(|data| {
            data.args
                .get("channel")
                .and_then(|value| match value {
                    Value::String(channel) => Some(vec![format!("CHANNEL_{channel}")]),
                    _ => None,
                })
                .unwrap_or_default()
        });
        assert!(!topics.is_statically_empty());
        assert_eq!(topics.resolve(&topic_data("general")), vec!["CHANNEL_general"]);
    }
}

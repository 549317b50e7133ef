//! Topic-based event delivery for subscription handlers.

use std::fmt;

use async_graphql::Value;
use async_stream::stream;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// Maximum number of events to buffer in the broadcast channel.
const EVENT_BUFFER_SIZE: usize = 1024;

/// Payload published under a topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicEvent {
    pub topic: String,
    pub payload: Value,
}

/// Event source subscription handlers listen to.
#[async_trait]
pub trait PubSubEngine: Send + Sync {
    /// Publishes a payload, returning how many subscribers received it.
    async fn publish(&self, topic: &str, payload: Value) -> usize;

    /// Returns the payloads published under any of `topics` from now on.
    fn subscribe(&self, topics: &[String]) -> BoxStream<'static, Value>;
}

/// In-process pub/sub engine backed by a broadcast channel.
///
/// Every subscriber sees every event and keeps the ones matching its topics.
#[derive(Clone)]
pub struct PubSub {
    sender: broadcast::Sender<TopicEvent>,
}

impl PubSub {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_BUFFER_SIZE)
    }

    /// Creates an engine buffering at most `capacity` undelivered events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for PubSub {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PubSub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PubSub")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[async_trait]
impl PubSubEngine for PubSub {
    async fn publish(&self, topic: &str, payload: Value) -> usize {
        let event = TopicEvent {
            topic: topic.to_string(),
            payload,
        };
        // No active receivers
        self.sender.send(event).unwrap_or(0)
    }

    fn subscribe(&self, topics: &[String]) -> BoxStream<'static, Value> {
        let mut receiver = self.sender.subscribe();
        let topics = topics.to_vec();
        debug!(?topics, "Subscribing to topics");

        Box::pin(stream! {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if !topics.contains(&event.topic) {
                            continue;
                        }
                        trace!(topic = %event.topic, "Delivering event");
                        yield event.payload;
                    }
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        warn!(count, "Subscription lagged, some events were dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Subscription channel closed");
                        break;
                    }
                }
            }
        })
    }
}

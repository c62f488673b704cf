//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

use game_core::{EventSink, GameMessage, GameplayTag};

/// Message wrapper that carries the topic it was published under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEvent {
    pub topic: GameplayTag,
    pub message: GameMessage,
}

/// Topic-based event bus
///
/// Implements [`EventSink`] so core components publish into it directly.
/// Channels are created the first time a topic is published to or
/// subscribed to. Delivery is best-effort: a slow receiver lags and a topic
/// nobody listens to drops its messages.
pub struct EventBus {
    capacity: usize,
    channels: Arc<RwLock<HashMap<GameplayTag, broadcast::Sender<BusEvent>>>>,
    all: broadcast::Sender<BusEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            channels: Arc::new(RwLock::new(HashMap::new())),
            all: broadcast::channel(capacity).0,
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive messages published under
    /// exactly that topic.
    pub fn subscribe(&self, topic: &GameplayTag) -> broadcast::Receiver<BusEvent> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[GameplayTag],
    ) -> HashMap<GameplayTag, broadcast::Receiver<BusEvent>> {
        topics
            .iter()
            .map(|topic| (topic.clone(), self.subscribe(topic)))
            .collect()
    }

    /// Subscribe to every topic, in publish order.
    pub fn subscribe_all(&self) -> broadcast::Receiver<BusEvent> {
        self.all.subscribe()
    }

    /// Number of topics that currently have a channel.
    pub fn topic_count(&self) -> usize {
        self.channels
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn sender(&self, topic: &GameplayTag) -> broadcast::Sender<BusEvent> {
        if let Some(tx) = self
            .channels
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(topic)
        {
            return tx.clone();
        }

        let mut channels = self
            .channels
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        channels
            .entry(topic.clone())
            .or_insert_with(|| {
                tracing::trace!(%topic, "created event bus channel");
                broadcast::channel(self.capacity).0
            })
            .clone()
    }
}

impl EventSink for EventBus {
    fn publish(&self, topic: &GameplayTag, message: GameMessage) {
        let event = BusEvent {
            topic: topic.clone(),
            message,
        };

        if self.sender(topic).send(event.clone()).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!(%topic, "no subscribers for topic");
        }
        let _ = self.all.send(event);
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            capacity: self.capacity,
            channels: Arc::clone(&self.channels),
            all: self.all.clone(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("capacity", &self.capacity)
            .field("topics", &self.topic_count())
            .finish()
    }
}

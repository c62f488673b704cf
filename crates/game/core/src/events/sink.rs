use std::sync::Mutex;

use super::GameMessage;
use crate::tags::GameplayTag;

/// Topic-keyed, fire-and-forget message publisher.
///
/// Implementations dispatch synchronously to current subscribers; there is
/// no delivery guarantee beyond that.
pub trait EventSink: Send + Sync {
    fn publish(&self, topic: &GameplayTag, message: GameMessage);
}

/// Sink that drops every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, topic: &GameplayTag, _message: GameMessage) {
        tracing::trace!(%topic, "message dropped by null sink");
    }
}

/// Sink that records every message in publish order.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Mutex<Vec<(GameplayTag, GameMessage)>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns and clears everything recorded so far.
    pub fn take(&self) -> Vec<(GameplayTag, GameMessage)> {
        let mut guard = self
            .messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *guard)
    }

    /// Copies of recorded messages published under `topic`.
    pub fn on_topic(&self, topic: &GameplayTag) -> Vec<GameMessage> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MessageLog {
    fn publish(&self, topic: &GameplayTag, message: GameMessage) {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((topic.clone(), message));
    }
}

use std::fmt;

/// Handle returned by [`Delegate::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Callback<E> = Box<dyn FnMut(&E) + Send>;

/// Multicast observer list.
///
/// Subscribers are invoked in subscription order, synchronously, once per
/// broadcast.
pub struct Delegate<E> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Callback<E>)>,
}

impl<E> Delegate<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&E) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if the subscription was not (or no longer) registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        before != self.subscribers.len()
    }

    pub fn clear(&mut self) {
        self.subscribers.clear();
    }

    pub fn broadcast(&mut self, event: &E) {
        for (_, callback) in &mut self.subscribers {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<E> Default for Delegate<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Delegate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delegate")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn broadcast_reaches_subscribers_in_order_until_unsubscribed() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut delegate = Delegate::<u32>::new();

        let first = {
            let seen = Arc::clone(&seen);
            delegate.subscribe(move |value| seen.lock().unwrap().push(("first", *value)))
        };
        {
            let seen = Arc::clone(&seen);
            delegate.subscribe(move |value| seen.lock().unwrap().push(("second", *value)));
        }

        delegate.broadcast(&1);
        assert!(delegate.unsubscribe(first));
        assert!(!delegate.unsubscribe(first));
        delegate.broadcast(&2);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![("first", 1), ("second", 1), ("second", 2)]
        );
    }
}

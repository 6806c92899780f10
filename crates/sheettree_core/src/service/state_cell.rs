//! Single-writer, multi-reader observable value.
//!
//! # Responsibility
//! - Hold the latest value of one piece of engine state.
//! - Deliver that value to every subscriber, then every later value.
//!
//! # Invariants
//! - A new subscriber first receives the value current at subscription time.
//! - Subscribers observe values in publish order, without gaps.
//! - Dropped subscribers are pruned on the next publish.

use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

struct Inner<T> {
    value: T,
    subscribers: Vec<UnboundedSender<T>>,
}

/// Observable cell owned by one writer.
pub struct StateCell<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: Clone> StateCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Mutex::new(Inner {
                value: initial,
                subscribers: Vec::new(),
            }),
        }
    }

    /// Returns a copy of the current value.
    pub fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// Replaces the value and notifies every live subscriber.
    pub fn publish(&self, value: T) {
        let mut inner = self.lock();
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(value.clone()).is_ok());
        inner.value = value;
    }

    /// Subscribes to the current value and all later ones.
    pub fn subscribe(&self) -> UnboundedReceiver<T> {
        let (sender, receiver) = unbounded_channel();
        let mut inner = self.lock();
        if sender.send(inner.value.clone()).is_ok() {
            inner.subscribers.push(sender);
        }
        receiver
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    // Publishing never panics while holding the lock, so a poisoned cell
    // still holds a consistent value.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StateCell;

    #[test]
    fn subscriber_gets_current_value_first() {
        let cell = StateCell::new(1);
        cell.publish(2);
        let mut receiver = cell.subscribe();
        assert_eq!(receiver.try_recv().unwrap(), 2);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn every_publish_is_delivered_in_order() {
        let cell = StateCell::new("a".to_string());
        let mut receiver = cell.subscribe();
        cell.publish("b".to_string());
        cell.publish("c".to_string());

        let seen: Vec<String> = std::iter::from_fn(|| receiver.try_recv().ok()).collect();
        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(cell.get(), "c");
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let cell = StateCell::new(false);
        let receiver = cell.subscribe();
        let _kept = cell.subscribe();
        assert_eq!(cell.subscriber_count(), 2);

        drop(receiver);
        cell.publish(true);
        assert_eq!(cell.subscriber_count(), 1);
    }
}

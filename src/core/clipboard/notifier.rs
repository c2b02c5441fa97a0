//! History change subscriptions
//!
//! Observers register a callback and receive `Some(item)` for every prepended
//! entry and `None` when the history is cleared. Delivery happens once per
//! event, in publish order.

use log::warn;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::shared::errors::CommandResult;
use crate::shared::types::ClipboardHistoryItem;

pub type SubscriptionId = u64;

type Callback = Arc<dyn Fn(Option<&ClipboardHistoryItem>) -> CommandResult<()> + Send + Sync>;

#[derive(Default)]
pub struct HistoryNotifier {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionId, Callback)>>,
}

impl HistoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. The returned id is used to unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Option<&ClipboardHistoryItem>) -> CommandResult<()> + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove an observer. Returns false if the id was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Deliver an event to every current subscriber.
    ///
    /// A failing subscriber is logged and skipped; the rest still receive the
    /// event. Returns how many subscribers accepted it.
    pub fn publish(&self, item: Option<&ClipboardHistoryItem>) -> usize {
        // Snapshot so callbacks may (un)subscribe without deadlocking
        let subscribers: Vec<(SubscriptionId, Callback)> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut delivered = 0;
        for (id, callback) in subscribers {
            match callback(item) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("[HistoryNotifier] Subscriber {} failed: {}", id, e),
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::errors::CommandError;

    #[test]
    fn delivers_in_publish_order() {
        let notifier = HistoryNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        notifier.subscribe(move |item| {
            sink.lock().unwrap().push(item.map(|i| i.content.clone()));
            Ok(())
        });

        let a = ClipboardHistoryItem::new_text("a".to_string());
        let b = ClipboardHistoryItem::new_text("b".to_string());
        notifier.publish(Some(&a));
        notifier.publish(Some(&b));
        notifier.publish(None);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("a".to_string()), Some("b".to_string()), None]
        );
    }

    #[test]
    fn failing_subscriber_does_not_block_others() {
        let notifier = HistoryNotifier::new();
        let hits = Arc::new(AtomicU64::new(0));
        notifier.subscribe(|_| Err(CommandError::WindowError("window destroyed".to_string())));
        let counter = Arc::clone(&hits);
        notifier.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(notifier.publish(None), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribed_observer_stops_receiving() {
        let notifier = HistoryNotifier::new();
        let hits = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&hits);
        let id = notifier.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        notifier.publish(None);
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.publish(None);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }
}

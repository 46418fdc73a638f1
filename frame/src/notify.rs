/// Handle returned by [`ChangeNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

type Callback = Box<dyn FnMut() + Send>;

/// Payload-free "frame changed" signal.
///
/// Subscribers run synchronously on the notifying thread, in registration
/// order.
#[derive(Default)]
pub struct ChangeNotifier {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Callback)>,
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("next_id", &self.next_id)
            .field(
                "subscribers",
                &self.subscribers.iter().map(|(id, _)| id.0).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut() + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        tracing::debug!(subscription = id.0, "frame subscriber registered");
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn notify(&mut self) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn notifies_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut notifier = ChangeNotifier::new();
        for tag in ["a", "b", "c"] {
            let log = Arc::clone(&log);
            notifier.subscribe(move || log.lock().unwrap().push(tag));
        }

        notifier.notify();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn unsubscribed_callback_is_not_called() {
        let hits = Arc::new(Mutex::new(0));
        let mut notifier = ChangeNotifier::new();
        let id = {
            let hits = Arc::clone(&hits);
            notifier.subscribe(move || *hits.lock().unwrap() += 1)
        };

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.notify();
        assert_eq!(*hits.lock().unwrap(), 0);
        assert!(notifier.is_empty());
    }

    #[test]
    fn ids_are_not_reused() {
        let mut notifier = ChangeNotifier::new();
        let a = notifier.subscribe(|| {});
        notifier.unsubscribe(a);
        let b = notifier.subscribe(|| {});
        assert_ne!(a, b);
    }
}

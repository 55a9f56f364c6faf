use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::handler::LogHandler;
use crate::severity::Severity;

type Subscriber = Arc<dyn Fn(Severity, &str) + Send + Sync>;

/// Identifies one subscriber of a [`LogDispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Handler that forwards every message to its subscribers.
///
/// This is the bridge towards code that reacts to log messages without being
/// a handler itself, such as a UI showing a message dialog. Subscribers are
/// called in connection order with the message unchanged. A message arriving
/// while nobody is connected is dropped.
///
/// # Examples
///
/// ```
/// use std::sync::{mpsc, Arc};
/// use fanlog::{LogDispatcher, LogHub, Severity};
///
/// let hub = LogHub::new();
/// let dispatcher = Arc::new(LogDispatcher::new());
/// hub.attach(&dispatcher);
///
/// let (tx, rx) = mpsc::channel();
/// let tx = std::sync::Mutex::new(tx);
/// dispatcher.connect(move |severity, text| {
///     let _ = tx.lock().unwrap().send((severity, text.to_owned()));
/// });
///
/// hub.critical().put("link down");
/// assert_eq!(rx.recv().unwrap(), (Severity::Critical, "link down ".to_owned()));
/// ```
#[derive(Default)]
pub struct LogDispatcher {
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber)>>,
    next_id: AtomicU64,
}

impl LogDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect<F>(&self, subscriber: F) -> SubscriptionId
    where
        F: Fn(Severity, &str) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, Arc::new(subscriber)));
        id
    }

    /// Returns `false` if `id` was not connected.
    pub fn disconnect(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(connected, _)| *connected != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl LogHandler for LogDispatcher {
    fn handle(&self, severity: Severity, text: &str) {
        // Subscribers may connect or disconnect from inside the callback.
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();
        for subscriber in subscribers {
            subscriber(severity, text);
        }
    }
}

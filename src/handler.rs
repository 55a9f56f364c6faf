use std::ops::Deref;
use std::sync::Arc;

use crate::log_hub::LogHub;
use crate::severity::Severity;

/// Consumer of finished log messages.
///
/// Implementations decide what a message turns into: a console line, a UI
/// notification, an entry in some storage. `handle` runs synchronously inside
/// the dispatch of the flushing [`Log`](crate::Log), so it should be quick and
/// it must deal with its own failures. Nothing is reported back to the hub,
/// and a panic here unwinds straight through the code that dropped the log.
///
/// A hub only keeps weak references to its handlers. Keep the `Arc` alive for
/// as long as the handler should receive messages.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use parking_lot::Mutex;
/// use fanlog::{LogHandler, LogHub, Severity};
///
/// #[derive(Default)]
/// struct Counter(Mutex<usize>);
///
/// impl LogHandler for Counter {
///     fn handle(&self, _severity: Severity, _text: &str) {
///         *self.0.lock() += 1;
///     }
/// }
///
/// let hub = LogHub::new();
/// let counter = Arc::new(Counter::default());
/// hub.attach(&counter);
/// hub.info().put("ping");
/// assert_eq!(*counter.0.lock(), 1);
/// ```
pub trait LogHandler: Send + Sync {
    /// Consumes one message of type `severity`.
    fn handle(&self, severity: Severity, text: &str);
}

/// Owns a handler on behalf of one hub and optionally detaches it on drop.
///
/// Auto-detach is off by default. Without it a dropped handler simply stops
/// receiving messages and its stale registry entry is pruned by the next
/// dispatch; with it the entry is removed right away.
pub struct ScopedHandler<H: LogHandler + 'static> {
    handler: Arc<H>,
    hub: LogHub,
    auto_detach: bool,
}

impl<H: LogHandler + 'static> ScopedHandler<H> {
    pub fn new(hub: &LogHub, handler: H) -> Self {
        Self::from_arc(hub, Arc::new(handler))
    }

    pub fn from_arc(hub: &LogHub, handler: Arc<H>) -> Self {
        Self {
            handler,
            hub: hub.clone(),
            auto_detach: false,
        }
    }

    /// Appends the handler to the hub's registry.
    pub fn attach(&self) {
        self.hub.attach(&self.handler);
    }

    /// Removes every registration of the handler from the hub.
    pub fn detach(&self) {
        self.hub.detach(&self.handler);
    }

    pub fn set_auto_detach(&mut self, enabled: bool) {
        self.auto_detach = enabled;
    }

    pub fn auto_detach(&self) -> bool {
        self.auto_detach
    }

    pub fn handler(&self) -> &Arc<H> {
        &self.handler
    }

    pub fn hub(&self) -> &LogHub {
        &self.hub
    }
}

impl<H: LogHandler + 'static> Deref for ScopedHandler<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handler
    }
}

impl<H: LogHandler + 'static> Drop for ScopedHandler<H> {
    fn drop(&mut self) {
        if self.auto_detach {
            self.hub.detach(&self.handler);
        }
    }
}

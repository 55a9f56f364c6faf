use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use lazy_static::lazy_static;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::handler::LogHandler;
use crate::log_stream::Log;
use crate::severity::{Message, Severity};

/// Routing of finished log messages.
///
/// A `LogHub` owns two pieces of state: the pending queue, which collects
/// messages while no handler is registered, and the handler registry, which
/// every later message is fanned out to. Clones share the same state.
///
/// # Single-thread discipline
///
/// The state sits behind a mutex only so that a hub can live in a `static`.
/// Logging, attaching and detaching are expected to happen on one logical
/// thread, or be serialized by the application. The lock is released before
/// any handler runs, so a handler may itself log without deadlocking. Such a
/// message is dispatched against the registry as it is at that moment.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use fanlog::{LogHub, MemoryHandler, Severity};
///
/// let hub = LogHub::new();
/// hub.debug().put("hello").put(42);
/// assert_eq!(hub.pending_len(), 1);
///
/// let memory = Arc::new(MemoryHandler::new());
/// hub.attach(&memory);
/// assert_eq!(hub.pending_len(), 0);
/// assert_eq!(memory.messages()[0].text, "hello 42 ");
/// assert_eq!(memory.messages()[0].severity, Severity::Debug);
/// ```
#[derive(Clone)]
pub struct LogHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    config: HubConfig,
    state: Mutex<HubState>,
}

#[derive(Default)]
struct HubState {
    handlers: Vec<Weak<dyn LogHandler>>,
    pending: VecDeque<Message>,
    dropped_pending: u64,
}

impl HubState {
    /// Forgets registrations whose handler no longer exists.
    fn prune(&mut self) {
        self.handlers.retain(|handler| handler.strong_count() > 0);
    }

    fn enqueue(&mut self, message: Message, limit: Option<usize>) {
        if let Some(limit) = limit {
            if limit == 0 {
                self.dropped_pending += 1;
                return;
            }
            while self.pending.len() >= limit {
                self.pending.pop_front();
                self.dropped_pending += 1;
            }
        }
        self.pending.push_back(message);
    }
}

/// Settings for a [`LogHub`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubConfig {
    /// Maximum number of messages kept while no handler is attached. `None`
    /// keeps everything; otherwise the oldest message makes room.
    pub pending_limit: Option<usize>,
}

impl HubConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pending_limit(self, limit: usize) -> Self {
        Self {
            pending_limit: Some(limit),
            ..self
        }
    }

    pub fn unbounded_pending(self) -> Self {
        Self {
            pending_limit: None,
            ..self
        }
    }
}

lazy_static! {
    /// Hub behind the free functions (`info_log`, `attach_global_handler`, ...).
    ///
    /// Created on first use and kept until the process exits.
    static ref GLOBAL_HUB: LogHub = LogHub::new();
}

fn handler_addr<H: ?Sized>(handler: *const H) -> *const () {
    handler as *const ()
}

impl LogHub {
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    pub fn with_config(config: HubConfig) -> Self {
        Self {
            inner: Arc::new(HubInner {
                config,
                state: Mutex::new(HubState::default()),
            }),
        }
    }

    /// The process-wide hub.
    pub fn global() -> &'static LogHub {
        &GLOBAL_HUB
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    /// Starts a message of type `severity` that flushes into this hub.
    pub fn log(&self, severity: Severity) -> Log {
        Log::new(self.clone(), severity)
    }

    pub fn debug(&self) -> Log {
        self.log(Severity::Debug)
    }

    pub fn info(&self) -> Log {
        self.log(Severity::Info)
    }

    pub fn warning(&self) -> Log {
        self.log(Severity::Warning)
    }

    pub fn critical(&self) -> Log {
        self.log(Severity::Critical)
    }

    pub fn fatal(&self) -> Log {
        self.log(Severity::Fatal)
    }

    /// Routes one finished message.
    ///
    /// With no live handler the message joins the pending queue. Otherwise
    /// every registration present when the call starts receives it, in
    /// registration order; a handler registered twice is called twice.
    pub fn dispatch(&self, severity: Severity, text: String) {
        // Diagnostics are emitted only once the guard is gone: a subscriber
        // may route them back into this hub.
        let mut state = self.inner.state.lock();
        state.prune();
        if state.handlers.is_empty() {
            let limit = self.inner.config.pending_limit;
            state.enqueue(Message { severity, text }, limit);
            let pending = state.pending.len();
            drop(state);
            trace!(%severity, pending, "no log handler, queueing message");
            return;
        }
        let targets: Vec<Arc<dyn LogHandler>> =
            state.handlers.iter().filter_map(Weak::upgrade).collect();
        drop(state);

        for handler in &targets {
            handler.handle(severity, &text);
        }
    }

    /// Registers `handler`.
    ///
    /// If the registry is empty, the pending queue is first delivered to
    /// `handler` in order and then emptied. Handlers attached later only see
    /// messages dispatched after they were attached.
    ///
    /// The hub does not keep `handler` alive. Dropping the last `Arc` silently
    /// ends the registration, so `hub.attach(&Arc::new(handler))` hands the
    /// backlog to a handler that is gone right after, and later messages
    /// queue up again. Keep the `Arc` for as long as messages should arrive.
    pub fn attach<H: LogHandler + 'static>(&self, handler: &Arc<H>) {
        let handler: Arc<dyn LogHandler> = handler.clone();
        self.attach_shared(&handler);
    }

    /// Same as [`attach`](Self::attach), for an already type-erased handler.
    pub fn attach_shared(&self, handler: &Arc<dyn LogHandler>) {
        // Messages logged by `handler` while it receives the backlog land in
        // the queue again, so keep draining until it stays empty.
        let mut flushed = 0;
        loop {
            let backlog = {
                let mut state = self.inner.state.lock();
                state.prune();
                if !state.handlers.is_empty() || state.pending.is_empty() {
                    break;
                }
                std::mem::take(&mut state.pending)
            };
            flushed += backlog.len();
            for message in backlog {
                handler.handle(message.severity, &message.text);
            }
        }

        let handlers = {
            let mut state = self.inner.state.lock();
            state.handlers.push(Arc::downgrade(handler));
            state.handlers.len()
        };
        debug!(handlers, flushed, "log handler attached");
    }

    /// Attaches `handler` if there is one.
    pub fn attach_opt<H: LogHandler + 'static>(&self, handler: Option<&Arc<H>>) {
        if let Some(handler) = handler {
            self.attach(handler);
        }
    }

    /// Removes every registration of `handler`. Unknown handlers are ignored.
    pub fn detach<H: LogHandler + ?Sized>(&self, handler: &Arc<H>) {
        self.detach_addr(handler_addr(Arc::as_ptr(handler)));
    }

    /// Detaches `handler` if there is one.
    pub fn detach_opt<H: LogHandler + ?Sized>(&self, handler: Option<&Arc<H>>) {
        if let Some(handler) = handler {
            self.detach(handler);
        }
    }

    fn detach_addr(&self, addr: *const ()) {
        let (removed, handlers) = {
            let mut state = self.inner.state.lock();
            let before = state.handlers.len();
            state
                .handlers
                .retain(|registered| handler_addr(registered.as_ptr()) != addr);
            (before - state.handlers.len(), state.handlers.len())
        };
        if removed > 0 {
            debug!(removed, handlers, "log handler detached");
        }
    }

    /// Number of registrations, dropped handlers excluded.
    pub fn handler_count(&self) -> usize {
        let mut state = self.inner.state.lock();
        state.prune();
        state.handlers.len()
    }

    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Messages discarded because the pending queue was at its limit.
    pub fn dropped_pending(&self) -> u64 {
        self.inner.state.lock().dropped_pending
    }
}

impl Default for LogHub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LogHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("LogHub")
            .field("config", &self.inner.config)
            .field("handlers", &state.handlers.len())
            .field("pending", &state.pending.len())
            .finish()
    }
}

/// Registers `handler` with the process-wide hub.
pub fn attach_global_handler<H: LogHandler + 'static>(handler: &Arc<H>) {
    LogHub::global().attach(handler);
}

/// Removes `handler` from the process-wide hub.
pub fn detach_global_handler<H: LogHandler + ?Sized>(handler: &Arc<H>) {
    LogHub::global().detach(handler);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::MemoryHandler;

    #[test]
    fn test_dispatch_without_handler_queues() {
        let hub = LogHub::new();
        hub.dispatch(Severity::Info, "a".into());
        hub.dispatch(Severity::Fatal, "b".into());
        assert_eq!(hub.pending_len(), 2);
        assert_eq!(hub.handler_count(), 0);
    }

    #[test]
    fn test_pending_limit_drops_oldest() {
        let hub = LogHub::with_config(HubConfig::new().with_pending_limit(2));
        for i in 0..5 {
            hub.dispatch(Severity::Debug, format!("{i}"));
        }
        assert_eq!(hub.pending_len(), 2);
        assert_eq!(hub.dropped_pending(), 3);

        let memory = Arc::new(MemoryHandler::new());
        hub.attach(&memory);
        let texts: Vec<_> = memory.take().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, ["3", "4"]);
    }

    #[test]
    fn test_zero_pending_limit_keeps_nothing() {
        let hub = LogHub::with_config(HubConfig::new().with_pending_limit(0));
        hub.dispatch(Severity::Warning, "lost".into());
        assert_eq!(hub.pending_len(), 0);
        assert_eq!(hub.dropped_pending(), 1);
    }

    #[test]
    fn test_dropped_handler_counts_as_absent() {
        let hub = LogHub::new();
        let memory = Arc::new(MemoryHandler::new());
        hub.attach(&memory);
        drop(memory);

        assert_eq!(hub.handler_count(), 0);
        hub.dispatch(Severity::Info, "after".into());
        assert_eq!(hub.pending_len(), 1);
    }

    #[test]
    fn test_detach_through_type_erased_arc() {
        let hub = LogHub::new();
        let memory = Arc::new(MemoryHandler::new());
        let erased: Arc<dyn LogHandler> = memory.clone();
        hub.attach(&memory);
        hub.attach_shared(&erased);
        assert_eq!(hub.handler_count(), 2);

        hub.detach(&erased);
        assert_eq!(hub.handler_count(), 0);
    }

    #[test]
    fn test_opt_variants_ignore_none() {
        let hub = LogHub::new();
        hub.attach_opt::<MemoryHandler>(None);
        hub.detach_opt::<MemoryHandler>(None);
        assert_eq!(hub.handler_count(), 0);

        let memory = Arc::new(MemoryHandler::new());
        hub.attach_opt(Some(&memory));
        assert_eq!(hub.handler_count(), 1);
        hub.detach_opt(Some(&memory));
        assert_eq!(hub.handler_count(), 0);
    }

    #[test]
    fn test_config_builders() {
        let config = HubConfig::new().with_pending_limit(8);
        assert_eq!(config.pending_limit, Some(8));
        assert_eq!(config.unbounded_pending(), HubConfig::default());
    }
}

use std::cell::RefCell;
use std::fmt;
use std::ops::Shl;
use std::rc::Rc;

use crate::log_hub::LogHub;
use crate::loggable::Loggable;
use crate::severity::Severity;

/// Text of one message being composed, shared by every clone of a [`Log`].
///
/// Dropped together with the last `Log` pointing at it, which is the one
/// and only moment its content is dispatched.
struct Stream {
    severity: Severity,
    text: String,
    hub: LogHub,
}

impl Drop for Stream {
    fn drop(&mut self) {
        let text = std::mem::take(&mut self.text);
        self.hub.dispatch(self.severity, text);
    }
}

/// Output stream for one log message.
///
/// Values are streamed in with [`put`](Self::put) or `<<`; each is followed by
/// a single space. Cloning a `Log` shares its buffer rather than copying it,
/// and the message is dispatched to the hub exactly once, when the last clone
/// goes away. A `Log` is bound to the thread that created it.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use fanlog::{LogHub, MemoryHandler};
///
/// let hub = LogHub::new();
/// let memory = Arc::new(MemoryHandler::new());
/// hub.attach(&memory);
///
/// hub.info().put("disk").put(93).put('%');
/// let _ = hub.warning() << "retrying" << true;
///
/// let texts: Vec<_> = memory.take().into_iter().map(|m| m.text).collect();
/// assert_eq!(texts, ["disk 93 % ", "retrying true "]);
/// ```
#[derive(Clone)]
pub struct Log {
    stream: Rc<RefCell<Stream>>,
}

impl Log {
    /// Starts an empty message of type `severity`, flushed into `hub`.
    pub fn new(hub: LogHub, severity: Severity) -> Self {
        Self {
            stream: Rc::new(RefCell::new(Stream {
                severity,
                text: String::new(),
                hub,
            })),
        }
    }

    /// Appends the textual form of `value` followed by a space.
    pub fn put<T: Loggable>(&mut self, value: T) -> &mut Self {
        value.render(&mut self.stream.borrow_mut().text);
        self.space()
    }

    /// Appends a single space.
    pub fn space(&mut self) -> &mut Self {
        self.stream.borrow_mut().text.push(' ');
        self
    }

    pub fn severity(&self) -> Severity {
        self.stream.borrow().severity
    }

    /// Text accumulated so far.
    pub fn text(&self) -> String {
        self.stream.borrow().text.clone()
    }

    /// Number of `Log` values currently sharing this buffer.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.stream)
    }

    /// Whether `self` and `other` compose the same message.
    pub fn shares_buffer(&self, other: &Log) -> bool {
        Rc::ptr_eq(&self.stream, &other.stream)
    }
}

impl<T: Loggable> Shl<T> for Log {
    type Output = Log;

    fn shl(mut self, value: T) -> Log {
        self.put(value);
        self
    }
}

/// `write!` appends raw text, with no trailing space.
impl fmt::Write for Log {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.stream.borrow_mut().text.push_str(s);
        Ok(())
    }
}

impl fmt::Debug for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stream = self.stream.borrow();
        f.debug_struct("Log")
            .field("severity", &stream.severity)
            .field("text", &stream.text)
            .field("ref_count", &self.ref_count())
            .finish()
    }
}

pub fn debug_log() -> Log {
    LogHub::global().debug()
}

pub fn info_log() -> Log {
    LogHub::global().info()
}

pub fn warning_log() -> Log {
    LogHub::global().warning()
}

pub fn critical_log() -> Log {
    LogHub::global().critical()
}

pub fn fatal_log() -> Log {
    LogHub::global().fatal()
}

/// Composes and flushes one message in a single statement.
///
/// Without a hub the process-wide one is used.
///
/// ```
/// use std::sync::Arc;
/// use fanlog::{log_values, LogHub, MemoryHandler, Severity};
///
/// let hub = LogHub::new();
/// let memory = Arc::new(MemoryHandler::new());
/// hub.attach(&memory);
/// log_values!(hub => Severity::Critical, "temperature", 25.5, "C");
/// assert_eq!(memory.messages()[0].text, "temperature 25.5 C ");
/// ```
#[macro_export]
macro_rules! log_values {
    ($hub:expr => $severity:expr $(, $value:expr)* $(,)?) => {{
        #[allow(unused_mut)]
        let mut log = $crate::LogHub::log(&$hub, $severity);
        $( log.put($value); )*
    }};
    ($severity:expr $(, $value:expr)* $(,)?) => {
        $crate::log_values!($crate::LogHub::global() => $severity $(, $value)*)
    };
}

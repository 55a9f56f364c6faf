//! Ready-made [`LogHandler`] implementations.

use std::fs::{File, OpenOptions};
use std::io::{self, Stderr, Stdout, Write};
use std::path::Path;

use parking_lot::Mutex;
use tracing::warn;

use crate::handler::LogHandler;
use crate::severity::{Message, Severity};

/// Writes every message as a `[SEVERITY] text` line.
///
/// Write errors are reported through `tracing` and otherwise ignored.
pub struct WriterHandler<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterHandler<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Runs `f` with exclusive access to the wrapped writer.
    pub fn with_writer<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        f(&mut self.writer.lock())
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl WriterHandler<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl WriterHandler<Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl WriterHandler<File> {
    /// Appends to the file at `path`, creating it if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<W: Write + Send> LogHandler for WriterHandler<W> {
    fn handle(&self, severity: Severity, text: &str) {
        let result = {
            let mut writer = self.writer.lock();
            writeln!(writer, "[{severity}] {}", text.trim_end()).and_then(|()| writer.flush())
        };
        if let Err(err) = result {
            warn!(%err, %severity, "failed to write log message");
        }
    }
}

/// Keeps every message it receives.
#[derive(Default)]
pub struct MemoryHandler {
    messages: Mutex<Vec<Message>>,
}

impl MemoryHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the messages received so far, oldest first.
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    /// Returns the received messages and forgets them.
    pub fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *self.messages.lock())
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl LogHandler for MemoryHandler {
    fn handle(&self, severity: Severity, text: &str) {
        self.messages.lock().push(Message::new(severity, text));
    }
}

/// Re-emits messages as `tracing` events under the `fanlog` target.
///
/// `Critical` and `Fatal` both become `ERROR` events; the original severity is
/// kept in the `severity` field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHandler;

impl TracingHandler {
    pub fn new() -> Self {
        Self
    }
}

impl LogHandler for TracingHandler {
    fn handle(&self, severity: Severity, text: &str) {
        let text = text.trim_end();
        match severity {
            Severity::Debug => tracing::debug!(target: "fanlog", %severity, "{text}"),
            Severity::Info => tracing::info!(target: "fanlog", %severity, "{text}"),
            Severity::Warning => tracing::warn!(target: "fanlog", %severity, "{text}"),
            Severity::Critical | Severity::Fatal => {
                tracing::error!(target: "fanlog", %severity, "{text}")
            }
        }
    }
}

/// Re-emits messages through the `log` facade.
#[derive(Debug, Clone)]
pub struct LogFacadeHandler {
    target: String,
}

impl LogFacadeHandler {
    pub fn new() -> Self {
        Self::with_target("fanlog")
    }

    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for LogFacadeHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl LogHandler for LogFacadeHandler {
    fn handle(&self, severity: Severity, text: &str) {
        log::log!(target: &self.target, log::Level::from(severity), "{}", text.trim_end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writer_handler_format() {
        let handler = WriterHandler::new(Vec::new());
        handler.handle(Severity::Warning, "disk almost full ");
        handler.handle(Severity::Debug, "x");
        let output = String::from_utf8(handler.into_inner()).unwrap();
        assert_eq!(output, "[WARNING] disk almost full\n[DEBUG] x\n");
    }

    #[test]
    fn test_writer_handler_swallows_errors() {
        let handler = WriterHandler::new(FailingWriter);
        handler.handle(Severity::Critical, "nobody hears this");
    }

    #[test]
    fn test_memory_handler_take() {
        let handler = MemoryHandler::new();
        assert!(handler.is_empty());
        handler.handle(Severity::Info, "one");
        handler.handle(Severity::Fatal, "two");
        assert_eq!(handler.len(), 2);
        assert_eq!(handler.messages()[1], Message::new(Severity::Fatal, "two"));
        assert_eq!(handler.take().len(), 2);
        assert!(handler.is_empty());
    }

    #[test]
    fn test_log_facade_target() {
        assert_eq!(LogFacadeHandler::new().target(), "fanlog");
        assert_eq!(LogFacadeHandler::with_target("app").target(), "app");
    }
}

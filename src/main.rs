use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fanlog::{
    attach_global_handler, critical_log, debug_log, info_log, warning_log, LogDispatcher, LogHub,
    ScopedHandler, Severity, TracingHandler, WriterHandler,
};
use tracing_subscriber::EnvFilter;

/// Logs a few messages through the global hub.
///
/// Output goes through `tracing` (filtered by `RUST_LOG`, default `info`).
/// An optional first argument names a file that receives every message too.
fn main() -> io::Result<()> {
    let (writer, _guard) = tracing_appender::non_blocking(io::stdout());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .init();

    // Nobody listens yet: both messages wait in the pending queue.
    let _ = info_log() << "demo starting, pid" << std::process::id();
    let _ = debug_log() << "pending before attach:" << true;

    let tracing_handler = Arc::new(TracingHandler::new());
    attach_global_handler(&tracing_handler);

    let file_handler = match std::env::args().nth(1) {
        Some(path) => {
            let handler = Arc::new(WriterHandler::create(&path)?);
            attach_global_handler(&handler);
            Some(handler)
        }
        None => None,
    };

    // Stand-in for a UI that pops up a dialog on serious messages.
    let alerts = Arc::new(AtomicUsize::new(0));
    let mut dialogs = ScopedHandler::new(LogHub::global(), LogDispatcher::new());
    dialogs.set_auto_detach(true);
    dialogs.attach();
    let counter = Arc::clone(&alerts);
    dialogs.connect(move |severity, _text| {
        if severity >= Severity::Critical {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    });

    let _ = warning_log() << "disk usage at" << 91.5 << "%";
    let _ = critical_log() << "replica" << 2 << "unreachable";

    drop(dialogs);
    let _ = info_log() << "alerts raised:" << alerts.load(Ordering::Relaxed);

    if let Some(handler) = file_handler {
        LogHub::global().detach(&handler);
    }
    LogHub::global().detach(&tracing_handler);
    Ok(())
}

use fanlog::{LogHub, MemoryHandler, Message, Severity, WriterHandler};
use std::cell::Cell;
use std::io::{self, Write};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;

thread_local! {
    static FORWARDING: Cell<bool> = const { Cell::new(false) };
}

/// Routes every `tracing` event into a hub, the way an application would to
/// show library diagnostics next to its own messages.
struct HubBridge {
    hub: LogHub,
}

impl<S: Subscriber> Layer<S> for HubBridge {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // Events raised while forwarding are not forwarded again.
        if FORWARDING.with(|forwarding| forwarding.replace(true)) {
            return;
        }
        let target = event.metadata().target().to_owned();
        self.hub.dispatch(Severity::Debug, target);
        FORWARDING.with(|forwarding| forwarding.set(false));
    }
}

/// Runs `f` on its own thread under a subscriber bridging into `hub`, and
/// fails instead of hanging if it does not finish.
fn run_bridged<T, F>(hub: LogHub, f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        let subscriber = tracing_subscriber::registry().with(HubBridge { hub });
        let result = tracing::subscriber::with_default(subscriber, f);
        let _ = done_tx.send(result);
    });
    done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("logging under a bridging subscriber did not complete")
}

#[test]
fn test_queueing_with_bridge_completes() {
    let hub = LogHub::new();
    let inner = hub.clone();
    let pending = run_bridged(hub, move || {
        inner.info().put("x");
        inner.pending_len()
    });
    // The message itself plus the queueing diagnostic routed back by the bridge.
    assert_eq!(pending, 2);
}

#[test]
fn test_attach_and_detach_with_bridge_complete() {
    let hub = LogHub::new();
    let inner = hub.clone();
    let received = run_bridged(hub, move || {
        inner.info().put("x");
        let memory = Arc::new(MemoryHandler::new());
        inner.attach(&memory);
        inner.warning().put("y");
        inner.detach(&memory);
        memory.take()
    });

    assert_eq!(received[0], Message::new(Severity::Info, "x "));
    assert!(received.contains(&Message::new(Severity::Warning, "y ")));
    assert!(received.iter().any(|m| m.text.starts_with("fanlog")));
}

struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_writer_error_reported_back_into_same_handler_completes() {
    let hub = LogHub::new();
    let inner = hub.clone();
    let pending = run_bridged(hub, move || {
        let writer = Arc::new(WriterHandler::new(BrokenPipe));
        inner.attach(&writer);
        inner.critical().put("lost");
        inner.pending_len()
    });
    assert_eq!(pending, 0);
}

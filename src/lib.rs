//! # fanlog
//!
//! A small in-process logging pipeline built around three ideas:
//!
//! * **Stream-style composition**: a [`Log`] collects values one by one, each
//!   followed by a space, and is dispatched when its last clone is dropped.
//! * **Fan-out**: a [`LogHub`] forwards every finished message to all of its
//!   registered [`LogHandler`]s, in registration order.
//! * **Nothing lost at startup**: messages logged before any handler exists
//!   are kept and handed to the first handler that gets attached.
//!
//! Messages are a flat text plus a [`Severity`]. There is no level filtering
//! and no structured data.
//!
//! ## Main Components
//!
//! * `severity`: `Severity` and the `Message` record
//! * `loggable`: what can be streamed into a `Log`
//! * `log_stream`: the `Log` handle and the global factory functions
//! * `log_hub`: pending queue, handler registry and dispatch
//! * `handler`: the `LogHandler` capability and `ScopedHandler`
//! * `log_dispatcher`: forwards messages to subscriber callbacks
//! * `handlers`: writer, memory, `tracing` and `log` handlers
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use fanlog::{LogHub, WriterHandler};
//!
//! let hub = LogHub::new();
//! hub.info().put("starting").put("worker").put(3);
//!
//! // The first handler receives what was logged before it existed.
//! let console = Arc::new(WriterHandler::stderr());
//! hub.attach(&console);
//!
//! let _ = hub.warning() << "queue depth" << 120;
//! hub.detach(&console);
//! ```
//!
//! The free functions [`info_log`], [`attach_global_handler`] and friends do
//! the same against the process-wide hub returned by [`LogHub::global`].

pub mod handler;
pub mod handlers;
pub mod log_dispatcher;
pub mod log_hub;
pub mod log_stream;
pub mod loggable;
pub mod severity;

pub use handler::{LogHandler, ScopedHandler};
pub use handlers::{LogFacadeHandler, MemoryHandler, TracingHandler, WriterHandler};
pub use log_dispatcher::{LogDispatcher, SubscriptionId};
pub use log_hub::{attach_global_handler, detach_global_handler, HubConfig, LogHub};
pub use log_stream::{critical_log, debug_log, fatal_log, info_log, warning_log, Log};
pub use loggable::Loggable;
pub use severity::{Message, ParseSeverityError, Severity};

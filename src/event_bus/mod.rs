//! In-process event bus for run observability.
//!
//! Runs publish lifecycle events (started / completed / failed) and nodes
//! publish scoped progress messages; sinks decide where they go. The
//! default sink prints to stdout; [`MemorySink`] captures for tests;
//! [`ChannelSink`] streams to an async consumer, which is where an external
//! publisher (message bus, SSE) would attach.
//!
//! The bus itself is transport-free: producers send over an unbounded
//! channel and a background listener task fans out to sinks, so emitting
//! never blocks a run.

pub mod bus;
pub mod event;
pub mod sink;

pub use bus::EventBus;
pub use event::{DiagnosticEvent, Event, NodeEvent, RunEvent, RunPhase};
pub use sink::{ChannelSink, EventSink, MemorySink, StdOutSink};

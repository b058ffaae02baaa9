//! Runner configuration.

use std::time::Duration;

use crate::event_bus::{EventBus, EventSink, MemorySink, StdOutSink};

use super::checkpointer::CheckpointerType;

/// Configuration for a [`ThreadRunner`](crate::runtimes::ThreadRunner).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use threadgraph::runtimes::RunnerConfig;
///
/// let config = RunnerConfig::default()
///     .with_max_steps(8)
///     .with_node_timeout(Duration::from_secs(5));
/// assert_eq!(config.max_steps, 8);
/// ```
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Upper bound on node executions per run; the termination guarantee
    /// for graphs with conditional cycles.
    pub max_steps: u32,
    /// Budget for a single node execution.
    pub node_timeout: Duration,
    /// How many times a run is re-applied after losing an optimistic save
    /// before surfacing the contention to the caller.
    pub save_retries: u32,
    /// When true, concurrent runs on the same thread id queue on an
    /// advisory per-thread lock instead of racing on the save. Versioning
    /// stays enforced either way.
    pub serialize_threads: bool,
    /// Which checkpoint backend the runner constructs.
    pub checkpointer: CheckpointerType,
    /// Database file for the SQLite backend (resolved from `SQLITE_DB_NAME`
    /// when not set explicitly).
    pub sqlite_db_name: Option<String>,
    /// Event bus sink configuration.
    pub event_bus: EventBusConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_steps: Self::DEFAULT_MAX_STEPS,
            node_timeout: Duration::from_secs(30),
            save_retries: 2,
            serialize_threads: false,
            checkpointer: CheckpointerType::InMemory,
            sqlite_db_name: Self::resolve_sqlite_db_name(None),
            event_bus: EventBusConfig::default(),
        }
    }
}

impl RunnerConfig {
    pub const DEFAULT_MAX_STEPS: u32 = 32;

    fn resolve_sqlite_db_name(provided: Option<String>) -> Option<String> {
        if let Some(name) = provided {
            return Some(name);
        }
        dotenvy::dotenv().ok();
        Some(std::env::var("SQLITE_DB_NAME").unwrap_or_else(|_| "threadgraph.db".to_string()))
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub fn with_node_timeout(mut self, node_timeout: Duration) -> Self {
        self.node_timeout = node_timeout;
        self
    }

    #[must_use]
    pub fn with_save_retries(mut self, save_retries: u32) -> Self {
        self.save_retries = save_retries;
        self
    }

    /// Queue concurrent same-thread runs instead of letting them race.
    #[must_use]
    pub fn with_serialized_threads(mut self) -> Self {
        self.serialize_threads = true;
        self
    }

    #[must_use]
    pub fn with_checkpointer(mut self, checkpointer: CheckpointerType) -> Self {
        self.checkpointer = checkpointer;
        self
    }

    #[must_use]
    pub fn with_sqlite_db_name(mut self, name: impl Into<String>) -> Self {
        self.sqlite_db_name = Self::resolve_sqlite_db_name(Some(name.into()));
        self
    }

    #[must_use]
    pub fn with_event_bus(mut self, event_bus: EventBusConfig) -> Self {
        self.event_bus = event_bus;
        self
    }
}

/// Which sinks a runner-owned event bus is built with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkConfig {
    StdOut,
    Memory,
}

/// Declarative event bus setup, resolved into an
/// [`EventBus`](crate::event_bus::EventBus) when the runner is built.
/// Additional sinks (e.g. channels for streaming) can be attached to the
/// live bus afterwards.
#[derive(Clone, Debug)]
pub struct EventBusConfig {
    pub sinks: Vec<SinkConfig>,
}

impl EventBusConfig {
    #[must_use]
    pub fn new(sinks: Vec<SinkConfig>) -> Self {
        Self { sinks }
    }

    #[must_use]
    pub fn with_stdout_only() -> Self {
        Self::new(vec![SinkConfig::StdOut])
    }

    /// Stdout plus an in-memory capture sink.
    #[must_use]
    pub fn with_memory_sink() -> Self {
        Self::new(vec![SinkConfig::StdOut, SinkConfig::Memory])
    }

    #[must_use]
    pub fn add_sink(mut self, sink: SinkConfig) -> Self {
        if !self.sinks.contains(&sink) {
            self.sinks.push(sink);
        }
        self
    }

    pub(crate) fn build_event_bus(&self) -> EventBus {
        let sinks: Vec<Box<dyn EventSink>> = self
            .sinks
            .iter()
            .map(|sink| match sink {
                SinkConfig::StdOut => Box::new(StdOutSink::default()) as Box<dyn EventSink>,
                SinkConfig::Memory => Box::new(MemorySink::new()) as Box<dyn EventSink>,
            })
            .collect();
        EventBus::with_sinks(sinks)
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self::with_stdout_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_methods_override_defaults() {
        let config = RunnerConfig::default()
            .with_max_steps(4)
            .with_save_retries(0)
            .with_serialized_threads();
        assert_eq!(config.max_steps, 4);
        assert_eq!(config.save_retries, 0);
        assert!(config.serialize_threads);
    }

    #[test]
    fn add_sink_deduplicates() {
        let config = EventBusConfig::with_stdout_only()
            .add_sink(SinkConfig::StdOut)
            .add_sink(SinkConfig::Memory);
        assert_eq!(config.sinks.len(), 2);
    }
}

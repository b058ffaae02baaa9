//! Runtime infrastructure: run execution, configuration, and checkpointing.
//!
//! The runtime layer is built around a few abstractions:
//!
//! - [`ThreadRunner`] - drives runs of a compiled graph against persisted
//!   conversation threads
//! - [`Checkpointer`] - pluggable persistence with optimistic versioning
//! - [`NodeExecutor`] - timeout-guarded, all-or-nothing node execution
//! - Persistence models - serde-friendly shapes for stored state
//!
//! # Persistence backends
//!
//! - [`InMemoryCheckpointer`] - volatile storage for tests and development
//! - [`SqliteCheckpointer`] - durable SQLite-backed persistence
//!   (feature `sqlite`, on by default)
//!
//! # Usage
//!
//! ```rust,no_run
//! use threadgraph::runtimes::{RunnerConfig, ThreadRunner};
//! # use threadgraph::graphs::Graph;
//! # async fn example(graph: Graph) -> Result<(), Box<dyn std::error::Error>> {
//! let runner = ThreadRunner::new(graph, RunnerConfig::default()).await?;
//! let outcome = runner.run(None, "Hello").await?;
//! println!("thread {} replied {:?}", outcome.thread_id, outcome.reply);
//! # Ok(())
//! # }
//! ```

pub mod checkpointer;
#[cfg(feature = "sqlite")]
pub mod checkpointer_sqlite;
pub mod execution;
pub mod persistence;
pub mod runner;
pub mod runtime_config;

pub use checkpointer::{
    Checkpointer, CheckpointerError, CheckpointerType, InMemoryCheckpointer, ThreadCheckpoint,
};
#[cfg(feature = "sqlite")]
pub use checkpointer_sqlite::SqliteCheckpointer;
pub use execution::{ExecutionError, NodeExecutor, RunOutcome};
pub use persistence::{PersistedThread, PersistenceError};
pub use runner::{RunnerError, ThreadRunner};
pub use runtime_config::{EventBusConfig, RunnerConfig, SinkConfig};

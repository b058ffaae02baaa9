//! Checkpoint storage contract and the in-memory backend.
//!
//! A checkpoint is the durable snapshot of one thread's
//! [`ConversationState`] at a version. The store provides the resumability
//! guarantee (load by thread id across independent invocations) and the
//! concurrency guarantee: saves are guarded by optimistic versioning, so a
//! stale writer is told about the conflict instead of silently clobbering
//! the winner.
//!
//! Checkpoints are never deleted by the engine; retention is an external
//! lifecycle concern.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::state::ConversationState;

/// Durable snapshot of one conversation thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThreadCheckpoint {
    pub thread_id: String,
    pub state: ConversationState,
    pub updated_at: DateTime<Utc>,
}

/// Errors from checkpoint storage.
#[derive(Debug, Error, Diagnostic)]
pub enum CheckpointerError {
    /// A concurrent writer persisted a newer version first. Nothing was
    /// written; the caller may reload and re-apply.
    #[error("version conflict on thread {thread_id}: expected {expected}, stored {actual}")]
    #[diagnostic(
        code(threadgraph::checkpointer::version_conflict),
        help("Reload the thread and re-apply the run, or serialize writers per thread.")
    )]
    VersionConflict {
        thread_id: String,
        expected: u64,
        actual: u64,
    },

    /// The storage backend failed.
    #[error("checkpoint backend error: {message}")]
    #[diagnostic(code(threadgraph::checkpointer::backend))]
    Backend { message: String },

    /// A persisted payload could not be (de)serialized.
    #[error("checkpoint serialization error: {source}")]
    #[diagnostic(
        code(threadgraph::checkpointer::serde),
        help("The stored JSON does not match the persisted thread shape.")
    )]
    Serde {
        #[source]
        source: serde_json::Error,
    },

    /// Anything else.
    #[error("checkpointer error: {message}")]
    #[diagnostic(code(threadgraph::checkpointer::other))]
    Other { message: String },
}

pub type Result<T> = std::result::Result<T, CheckpointerError>;

/// Which persistence backend a runner should construct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckpointerType {
    /// Volatile map, for tests and ephemeral runs.
    InMemory,
    /// Durable SQLite database.
    #[cfg(feature = "sqlite")]
    Sqlite,
}

/// Pluggable persistence for thread checkpoints.
///
/// Between runs the store owns the state; during a run the runner owns a
/// loaded copy and hands it back through [`save`](Checkpointer::save).
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Load the latest checkpoint for a thread.
    ///
    /// `Ok(None)` means the thread has never been persisted.
    async fn load(&self, thread_id: &str) -> Result<Option<ThreadCheckpoint>>;

    /// Persist `state` iff the stored version still equals
    /// `expected_version` (0 = the thread has never been saved).
    ///
    /// Returns the newly stamped version (`expected_version + 1`) on
    /// success. The save is atomic per thread id: on
    /// [`CheckpointerError::VersionConflict`] nothing has been written.
    async fn save(&self, state: &ConversationState, expected_version: u64) -> Result<u64>;

    /// All thread ids with at least one persisted checkpoint.
    async fn list_threads(&self) -> Result<Vec<String>>;
}

/// Volatile checkpointer backed by a mutex-guarded map.
///
/// Versioning semantics are identical to the durable backends, which makes
/// it the reference implementation for concurrency tests.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointer {
    threads: Mutex<FxHashMap<String, ThreadCheckpoint>>,
}

impl InMemoryCheckpointer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn load(&self, thread_id: &str) -> Result<Option<ThreadCheckpoint>> {
        let threads = self.threads.lock().expect("checkpointer poisoned");
        Ok(threads.get(thread_id).cloned())
    }

    async fn save(&self, state: &ConversationState, expected_version: u64) -> Result<u64> {
        let mut threads = self.threads.lock().expect("checkpointer poisoned");
        let actual = threads
            .get(state.thread_id())
            .map(|cp| cp.state.version())
            .unwrap_or(0);
        if actual != expected_version {
            return Err(CheckpointerError::VersionConflict {
                thread_id: state.thread_id().to_string(),
                expected: expected_version,
                actual,
            });
        }
        let version = expected_version + 1;
        threads.insert(
            state.thread_id().to_string(),
            ThreadCheckpoint {
                thread_id: state.thread_id().to_string(),
                state: state.at_version(version),
                updated_at: Utc::now(),
            },
        );
        Ok(version)
    }

    async fn list_threads(&self) -> Result<Vec<String>> {
        let threads = self.threads.lock().expect("checkpointer poisoned");
        Ok(threads.keys().cloned().collect())
    }
}

//! Serde-friendly persisted shapes for thread state.
//!
//! Kept deliberately separate from the in-memory representations so the
//! stored layout stays stable while internals evolve. This module performs
//! no I/O; it is pure data transformation shared by the durable backends.

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::message::Message;
use crate::runtimes::checkpointer::CheckpointerError;
use crate::state::ConversationState;

/// Persisted body of a thread checkpoint.
///
/// `version` and `updated_at` live beside this payload as columns; the body
/// itself carries the message history and the shared metadata map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedThread {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub extra: FxHashMap<String, Value>,
}

/// Serialization errors for persisted shapes.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("JSON serialization/deserialization failed: {source}")]
    #[diagnostic(
        code(threadgraph::persistence::serde),
        help("Ensure the stored JSON matches the PersistedThread shape.")
    )]
    Serde {
        #[source]
        source: serde_json::Error,
    },
}

impl From<PersistenceError> for CheckpointerError {
    fn from(e: PersistenceError) -> Self {
        match e {
            PersistenceError::Serde { source } => CheckpointerError::Serde { source },
        }
    }
}

impl From<&ConversationState> for PersistedThread {
    fn from(state: &ConversationState) -> Self {
        Self {
            messages: state.messages().to_vec(),
            extra: state.extra().clone(),
        }
    }
}

impl PersistedThread {
    /// Serialize to the stored JSON form.
    pub fn to_json_string(&self) -> Result<String, PersistenceError> {
        serde_json::to_string(self).map_err(|source| PersistenceError::Serde { source })
    }

    /// Parse from the stored JSON form.
    pub fn from_json_str(s: &str) -> Result<Self, PersistenceError> {
        serde_json::from_str(s).map_err(|source| PersistenceError::Serde { source })
    }

    /// Rebuild the in-memory state this payload was captured from.
    #[must_use]
    pub fn into_state(self, thread_id: impl Into<String>, version: u64) -> ConversationState {
        ConversationState::restore(thread_id, self.messages, self.extra, version)
    }
}

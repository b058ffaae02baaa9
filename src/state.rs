//! Conversation state and its evolution rules.
//!
//! A [`ConversationState`] is the unit of persistence and the value that
//! flows through a run: load it from a checkpoint, append the caller's
//! message, fold in one [`NodeDelta`](crate::node::NodeDelta) per executed
//! node, and save the result. All evolution methods return a **new** state
//! and leave the receiver untouched, so a concurrent reader can never
//! observe a half-applied update.
//!
//! Ownership follows the run lifecycle: the graph runner owns the state
//! while a run is in flight; the checkpoint store owns it in between.
//!
//! # Examples
//!
//! ```
//! use threadgraph::message::Message;
//! use threadgraph::state::ConversationState;
//!
//! let state = ConversationState::new("thread-1");
//! let next = state.append(Message::user("Hello"));
//!
//! assert_eq!(state.messages().len(), 0); // original untouched
//! assert_eq!(next.messages().len(), 1);
//! ```

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::message::{Message, Role};
use crate::node::NodeDelta;

/// The state of one conversation thread.
///
/// Holds the ordered message history, a free-form `extra` map for metadata
/// nodes want to share across steps, and the persisted-checkpoint version.
///
/// `version` is owned by the checkpoint store: it is `0` for a state that has
/// never been saved, and the store stamps `expected + 1` on every successful
/// save. Engine code reads the version (it is the optimistic-concurrency
/// token) but never bumps it directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationState {
    thread_id: String,
    messages: Vec<Message>,
    extra: FxHashMap<String, Value>,
    version: u64,
}

impl ConversationState {
    /// Fresh, never-persisted state for a thread.
    #[must_use]
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages: Vec::new(),
            extra: FxHashMap::default(),
            version: 0,
        }
    }

    /// Fresh state seeded with an existing message history.
    #[must_use]
    pub fn with_history(thread_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages,
            extra: FxHashMap::default(),
            version: 0,
        }
    }

    /// Rebuilds a state from its persisted parts.
    ///
    /// Intended for checkpoint backends restoring a snapshot; this is the
    /// only public way to construct a state with a nonzero version.
    #[must_use]
    pub fn restore(
        thread_id: impl Into<String>,
        messages: Vec<Message>,
        extra: FxHashMap<String, Value>,
        version: u64,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages,
            extra,
            version,
        }
    }

    /// The thread this state belongs to.
    #[must_use]
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// The ordered message history.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Metadata shared between nodes.
    #[must_use]
    pub fn extra(&self) -> &FxHashMap<String, Value> {
        &self.extra
    }

    /// The version of the checkpoint this state was loaded from
    /// (0 = never persisted).
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns a copy with one message appended. The receiver is unchanged.
    #[must_use]
    pub fn append(&self, message: Message) -> Self {
        let mut next = self.clone();
        next.messages.push(message);
        next
    }

    /// Returns a copy with a node's delta folded in: new messages are
    /// appended in order, `extra` entries are merged key-by-key (last write
    /// wins). The receiver is unchanged.
    #[must_use]
    pub fn apply(&self, delta: &NodeDelta) -> Self {
        let mut next = self.clone();
        if let Some(messages) = &delta.messages {
            next.messages.extend(messages.iter().cloned());
        }
        if let Some(extra) = &delta.extra {
            for (key, value) in extra {
                next.extra.insert(key.clone(), value.clone());
            }
        }
        next
    }

    /// Copy of this state stamped with a persisted version.
    ///
    /// Intended for checkpoint backends after a successful save.
    #[must_use]
    pub fn at_version(&self, version: u64) -> Self {
        let mut next = self.clone();
        next.version = version;
        next
    }

    /// Read-only snapshot handed to nodes and edge predicates.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            thread_id: self.thread_id.clone(),
            messages: self.messages.clone(),
            extra: self.extra.clone(),
            version: self.version,
        }
    }

    /// The most recent assistant message, if any. This is what a completed
    /// run reports as its reply.
    #[must_use]
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.has_role(Role::Assistant))
    }

    /// Consumes the state, yielding the message history.
    #[must_use]
    pub fn into_history(self) -> Vec<Message> {
        self.messages
    }
}

/// Immutable view of a [`ConversationState`] at a point in time.
///
/// Snapshots are cloned out of the live state, so a node can read them
/// freely while the runner continues to evolve its own copy.
#[derive(Clone, Debug)]
pub struct StateSnapshot {
    /// The thread being processed.
    pub thread_id: String,
    /// Messages at the time of the snapshot.
    pub messages: Vec<Message>,
    /// Metadata at the time of the snapshot.
    pub extra: FxHashMap<String, Value>,
    /// Persisted version the run started from.
    pub version: u64,
}

impl StateSnapshot {
    /// The most recent user message, if any.
    #[must_use]
    pub fn latest_user(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.has_role(Role::User))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn append_leaves_original_unmodified() {
        let state = ConversationState::new("t");
        let next = state.append(Message::user("hi"));
        assert!(state.messages().is_empty());
        assert_eq!(next.messages().len(), 1);
        assert_eq!(next.thread_id(), "t");
    }

    #[test]
    fn apply_appends_messages_and_merges_extra() {
        let state = ConversationState::new("t").append(Message::user("q"));
        let mut extra = FxHashMap::default();
        extra.insert("k".to_string(), json!(1));
        let delta = NodeDelta::new()
            .with_messages(vec![Message::assistant("a")])
            .with_extra(extra);

        let next = state.apply(&delta);
        assert_eq!(next.messages().len(), 2);
        assert_eq!(next.extra().get("k"), Some(&json!(1)));
        // original untouched
        assert_eq!(state.messages().len(), 1);
        assert!(state.extra().is_empty());
    }

    #[test]
    fn empty_delta_is_a_no_op() {
        let state = ConversationState::new("t").append(Message::user("q"));
        let next = state.apply(&NodeDelta::default());
        assert_eq!(next, state);
    }

    #[test]
    fn version_is_only_changed_by_stamping() {
        let state = ConversationState::new("t");
        assert_eq!(state.version(), 0);
        let appended = state.append(Message::user("x"));
        assert_eq!(appended.version(), 0);
        assert_eq!(appended.at_version(3).version(), 3);
    }

    #[test]
    fn last_assistant_scans_from_the_end() {
        let state = ConversationState::with_history(
            "t",
            vec![
                Message::assistant("first"),
                Message::user("q"),
                Message::assistant("second"),
            ],
        );
        assert_eq!(state.last_assistant().unwrap().content, "second");
    }

    #[test]
    fn snapshot_is_independent_of_later_mutation() {
        let state = ConversationState::new("t").append(Message::user("one"));
        let snapshot = state.snapshot();
        let _later = state.append(Message::user("two"));
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.latest_user().unwrap().content, "one");
    }
}

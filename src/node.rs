//! Node execution primitives.
//!
//! A [`Node`] is a single unit of graph-driven processing: it receives a
//! read-only [`StateSnapshot`], does its work, and describes the resulting
//! state change as a [`NodeDelta`]. Nodes never mutate state directly; the
//! runner folds deltas in, which is what makes node effects all-or-nothing.
//!
//! # Examples
//!
//! ```
//! use async_trait::async_trait;
//! use threadgraph::message::Message;
//! use threadgraph::node::{Node, NodeContext, NodeDelta, NodeError};
//! use threadgraph::state::StateSnapshot;
//!
//! struct GreetingNode;
//!
//! #[async_trait]
//! impl Node for GreetingNode {
//!     async fn run(
//!         &self,
//!         _snapshot: StateSnapshot,
//!         ctx: NodeContext,
//!     ) -> Result<NodeDelta, NodeError> {
//!         ctx.emit("greeting", "composing reply")?;
//!         Ok(NodeDelta::new().with_messages(vec![Message::assistant("Hello!")]))
//!     }
//! }
//! ```

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use crate::event_bus::Event;
use crate::message::Message;
use crate::model::ModelError;
use crate::state::StateSnapshot;

/// A unit of work in the conversation graph.
///
/// Implementations should be stateless and side-effect free with respect to
/// conversation state: everything they want to change goes into the returned
/// [`NodeDelta`]. A node that fails returns an error and contributes nothing.
#[async_trait]
pub trait Node: Send + Sync {
    /// Execute this node against a snapshot of the current state.
    async fn run(&self, snapshot: StateSnapshot, ctx: NodeContext)
    -> Result<NodeDelta, NodeError>;
}

/// Execution context handed to a node for one invocation.
#[derive(Clone, Debug)]
pub struct NodeContext {
    /// Name this node is registered under in the graph.
    pub node: String,
    /// Step number within the current run (0-based).
    pub step: u64,
    /// Sender half of the event bus, for observability.
    pub event_sender: flume::Sender<Event>,
}

impl NodeContext {
    /// Emit a node-scoped event enriched with this context's metadata.
    pub fn emit(
        &self,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), NodeContextError> {
        self.event_sender
            .send(Event::node_message_with_meta(
                self.node.clone(),
                self.step,
                scope,
                message,
            ))
            .map_err(|_| NodeContextError::EventBusUnavailable)
    }
}

/// The state change a node wants to make.
///
/// Both fields are optional so a node only describes the aspects it touches:
/// `messages` are appended to the history in order, `extra` entries are
/// merged key-by-key. An empty delta is a valid no-op.
#[derive(Clone, Debug, Default)]
pub struct NodeDelta {
    /// Messages to append to the conversation history.
    pub messages: Option<Vec<Message>>,
    /// Metadata entries to merge into the state's extra map.
    pub extra: Option<FxHashMap<String, Value>>,
}

impl NodeDelta {
    /// An empty delta.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the messages to append.
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Sets the metadata entries to merge.
    #[must_use]
    pub fn with_extra(mut self, extra: FxHashMap<String, Value>) -> Self {
        self.extra = Some(extra);
        self
    }
}

/// Errors from [`NodeContext`] methods.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeContextError {
    /// Event could not be sent because the bus is disconnected.
    #[error("failed to emit event: event bus unavailable")]
    #[diagnostic(
        code(threadgraph::node::event_bus_unavailable),
        help("The event bus listener may have shut down before the run finished.")
    )]
    EventBusUnavailable,
}

/// Errors a node can raise. Any of these aborts the run; a node failure is
/// never silently swallowed.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// Expected input data is missing from the state snapshot.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(threadgraph::node::missing_input),
        help("Check that an upstream node produced the required data.")
    )]
    MissingInput { what: &'static str },

    /// A model backend call failed; the classification is preserved.
    #[error(transparent)]
    #[diagnostic(code(threadgraph::node::model))]
    Model(#[from] ModelError),

    /// JSON serialization/deserialization error.
    #[error(transparent)]
    #[diagnostic(code(threadgraph::node::serde_json))]
    Serde(#[from] serde_json::Error),

    /// Free-form node failure.
    #[error("node failed: {0}")]
    #[diagnostic(code(threadgraph::node::failed))]
    Failed(String),

    /// Event bus communication error.
    #[error("event bus error: {0}")]
    #[diagnostic(code(threadgraph::node::event_bus))]
    EventBus(#[from] NodeContextError),
}

//! Single-node execution with timeout enforcement.

use std::sync::Arc;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;
use tokio::time::timeout;

use crate::message::Message;
use crate::node::{Node, NodeContext, NodeDelta, NodeError};
use crate::state::StateSnapshot;

/// A single node failed; the run aborts and nothing is persisted.
#[derive(Debug, Error, Diagnostic)]
pub enum ExecutionError {
    /// The node did not finish within the configured budget. Any partial
    /// work it did is discarded.
    #[error("node {node:?} timed out after {after:?} at step {step}")]
    #[diagnostic(
        code(threadgraph::execution::timeout),
        help("Raise RunnerConfig::node_timeout or split the node's work.")
    )]
    Timeout {
        node: String,
        step: u64,
        after: Duration,
    },

    /// The node reported a failure; the cause is preserved.
    #[error("node {node:?} failed at step {step}: {source}")]
    #[diagnostic(code(threadgraph::execution::node))]
    Node {
        node: String,
        step: u64,
        #[source]
        source: NodeError,
    },
}

/// Runs one node under the configured timeout.
///
/// Node effects are all-or-nothing: the delta is only surfaced on success,
/// so a timed-out or failed node contributes nothing to the state.
#[derive(Clone, Debug)]
pub struct NodeExecutor {
    node_timeout: Duration,
}

impl NodeExecutor {
    #[must_use]
    pub fn new(node_timeout: Duration) -> Self {
        Self { node_timeout }
    }

    /// Execute `node` against `snapshot`, reporting timeouts and failures
    /// as typed errors.
    pub async fn execute(
        &self,
        name: &str,
        node: &Arc<dyn Node>,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodeDelta, ExecutionError> {
        let step = ctx.step;
        match timeout(self.node_timeout, node.run(snapshot, ctx)).await {
            Err(_) => Err(ExecutionError::Timeout {
                node: name.to_string(),
                step,
                after: self.node_timeout,
            }),
            Ok(Err(source)) => Err(ExecutionError::Node {
                node: name.to_string(),
                step,
                source,
            }),
            Ok(Ok(delta)) => Ok(delta),
        }
    }
}

/// Result of a completed run.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// The thread the run executed against. Echoed so callers that omitted
    /// the id can resume the freshly minted thread later.
    pub thread_id: String,
    /// Content of the last assistant message, if the run produced one.
    pub reply: Option<String>,
    /// The full persisted message history after the run.
    pub history: Vec<Message>,
    /// The checkpoint version stamped by the save.
    pub version: u64,
    /// How many node executions the run took.
    pub steps: u64,
}

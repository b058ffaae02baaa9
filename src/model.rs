//! Boundary to hosted language-model backends.
//!
//! The engine only sees this contract: an ordered message history in, one
//! role-tagged message out, under a caller-specified timeout, with failures
//! classified into timeout / rate-limited / backend error. Wire formats,
//! connection pools, and retry policy all live behind implementations of
//! [`ModelClient`] - the engine never retries a model call itself, so
//! backend reliability concerns stay out of graph-execution semantics.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;

use crate::message::Message;
use crate::node::{Node, NodeContext, NodeDelta, NodeError};
use crate::state::StateSnapshot;

/// Default budget for a single completion call.
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);

/// A client capable of producing one completion for a message history.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Request a completion for `messages`, observing `timeout`.
    ///
    /// Implementations must classify failures into the [`ModelError`]
    /// variants; if they perform their own bounded retries, they do so
    /// before reporting a failure here.
    async fn complete(
        &self,
        messages: &[Message],
        timeout: Duration,
    ) -> Result<Message, ModelError>;
}

/// Classified model backend failures.
#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    /// The backend did not answer within the given budget.
    #[error("model call timed out after {after:?}")]
    #[diagnostic(
        code(threadgraph::model::timeout),
        help("Raise the completion timeout or pick a faster backend.")
    )]
    Timeout { after: Duration },

    /// The backend refused the request due to rate limiting.
    #[error("model backend rate limited the request")]
    #[diagnostic(
        code(threadgraph::model::rate_limited),
        help("Retry policy belongs to the ModelClient implementation, not the engine.")
    )]
    RateLimited,

    /// Any other backend failure.
    #[error("model backend error: {message}")]
    #[diagnostic(code(threadgraph::model::backend))]
    Backend { message: String },
}

/// The stock "call the model with the current state" node.
///
/// Forwards the snapshot's full message history to a [`ModelClient`] and
/// returns the completion as a single assistant-message delta. Model
/// failures surface as [`NodeError::Model`] and abort the run like any
/// other node failure.
pub struct CompletionNode {
    client: Arc<dyn ModelClient>,
    timeout: Duration,
}

impl CompletionNode {
    /// Wraps a model client with the default completion timeout.
    #[must_use]
    pub fn new(client: Arc<dyn ModelClient>) -> Self {
        Self {
            client,
            timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }

    /// Overrides the completion timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Node for CompletionNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodeDelta, NodeError> {
        ctx.emit(
            "completion",
            format!("requesting completion over {} messages", snapshot.messages.len()),
        )?;
        let reply = self.client.complete(&snapshot.messages, self.timeout).await?;
        Ok(NodeDelta::new().with_messages(vec![reply]))
    }
}

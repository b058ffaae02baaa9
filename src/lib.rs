//! # Threadgraph: graph-driven conversation orchestration
//!
//! Threadgraph drives multi-step conversations through a directed graph of
//! processing nodes, carrying a mutable conversation state across steps and
//! resuming a thread across independent invocations by persisting state
//! keyed by thread id.
//!
//! ## Core concepts
//!
//! - **Messages**: role-tagged conversation entries with a closed role set
//! - **State**: value-semantic conversation state with persisted versioning
//! - **Nodes**: async units of work that read a snapshot and return a delta
//! - **Graph**: immutable, validated topology shared across concurrent runs
//! - **Checkpointer**: durable thread storage with optimistic concurrency
//! - **Runner**: walks the graph from entry to terminal and persists the
//!   result
//!
//! ## Quick start
//!
//! ```
//! use async_trait::async_trait;
//! use threadgraph::graphs::{EdgeTarget, GraphBuilder};
//! use threadgraph::message::Message;
//! use threadgraph::node::{Node, NodeContext, NodeDelta, NodeError};
//! use threadgraph::runtimes::{RunnerConfig, ThreadRunner};
//! use threadgraph::state::StateSnapshot;
//!
//! struct EchoNode;
//!
//! #[async_trait]
//! impl Node for EchoNode {
//!     async fn run(
//!         &self,
//!         snapshot: StateSnapshot,
//!         _ctx: NodeContext,
//!     ) -> Result<NodeDelta, NodeError> {
//!         let latest = snapshot
//!             .latest_user()
//!             .map(|m| m.content.clone())
//!             .unwrap_or_default();
//!         Ok(NodeDelta::new().with_messages(vec![Message::assistant(format!("Echo: {latest}"))]))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = GraphBuilder::new()
//!     .add_node("reply", EchoNode)
//!     .set_entry("reply")
//!     .add_edge("reply", EdgeTarget::Terminal)
//!     .compile()?;
//!
//! let runner = ThreadRunner::new(graph, RunnerConfig::default()).await?;
//!
//! let outcome = runner.run(Some("t1"), "hello").await?;
//! assert_eq!(outcome.reply.as_deref(), Some("Echo: hello"));
//! assert_eq!(outcome.version, 1);
//!
//! // Same thread id, later invocation: the history resumes.
//! let outcome = runner.run(Some("t1"), "again").await?;
//! assert_eq!(outcome.history.len(), 4);
//! assert_eq!(outcome.version, 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Calling a model backend
//!
//! The stock [`model::CompletionNode`] forwards the thread history to any
//! [`model::ModelClient`] implementation and appends the completion as the
//! assistant reply. Backend wire formats, pooling, and retry policy live
//! behind that trait; the engine only sees classified errors.
//!
//! ## Module guide
//!
//! - [`message`] - message and role types
//! - [`state`] - conversation state, snapshots, and evolution rules
//! - [`node`] - the [`Node`](node::Node) trait and delta type
//! - [`model`] - the model-backend boundary
//! - [`graphs`] - graph definition and compilation
//! - [`runtimes`] - runner, configuration, and checkpointing
//! - [`event_bus`] - run/node observability events and sinks
//! - [`telemetry`] - tracing subscriber helpers

pub mod event_bus;
pub mod graphs;
pub mod message;
pub mod model;
pub mod node;
pub mod runtimes;
pub mod state;
pub mod telemetry;
pub mod utils;

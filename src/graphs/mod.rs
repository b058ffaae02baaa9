//! Graph definition and compilation.
//!
//! A conversation graph is a set of named [`Node`]s, a single outgoing
//! [`Edge`](edges::Edge) per node, and an entry node. [`GraphBuilder`]
//! assembles the pieces; [`GraphBuilder::compile`] validates them into an
//! immutable [`Graph`] that any number of concurrent runs can share.
//!
//! # Quick start
//!
//! ```
//! use threadgraph::graphs::{EdgeTarget, GraphBuilder};
//! use threadgraph::node::{Node, NodeContext, NodeDelta, NodeError};
//! use threadgraph::state::StateSnapshot;
//! use async_trait::async_trait;
//!
//! struct Passthrough;
//!
//! #[async_trait]
//! impl Node for Passthrough {
//!     async fn run(&self, _: StateSnapshot, _: NodeContext) -> Result<NodeDelta, NodeError> {
//!         Ok(NodeDelta::default())
//!     }
//! }
//!
//! let graph = GraphBuilder::new()
//!     .add_node("first", Passthrough)
//!     .add_node("second", Passthrough)
//!     .set_entry("first")
//!     .add_edge("first", "second")
//!     .add_edge("second", EdgeTarget::Terminal)
//!     .compile()
//!     .unwrap();
//! ```

pub mod builder;
pub mod compilation;
pub mod edges;

pub use builder::GraphBuilder;
pub use compilation::CompileError;
pub use edges::{Edge, EdgePredicate, EdgeTarget};

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

use crate::node::Node;

/// A compiled, validated conversation graph.
///
/// Immutable by construction: the only way to obtain one is
/// [`GraphBuilder::compile`], and nothing mutates it afterwards. This is
/// what makes a single graph value safe to share (via `Arc`) across
/// concurrent runs.
pub struct Graph {
    nodes: FxHashMap<String, Arc<dyn Node>>,
    edges: FxHashMap<String, Edge>,
    entry: String,
}

impl Graph {
    pub(crate) fn from_parts(
        nodes: FxHashMap<String, Arc<dyn Node>>,
        edges: FxHashMap<String, Edge>,
        entry: String,
    ) -> Self {
        Self {
            nodes,
            edges,
            entry,
        }
    }

    /// Name of the node execution starts from.
    #[must_use]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Looks up a registered node by name.
    #[must_use]
    pub fn node(&self, name: &str) -> Option<&Arc<dyn Node>> {
        self.nodes.get(name)
    }

    /// Looks up a node's outgoing edge.
    #[must_use]
    pub fn edge(&self, name: &str) -> Option<&Edge> {
        self.edges.get(name)
    }

    /// Names of all registered nodes, in no particular order.
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.node_names().collect();
        names.sort_unstable();
        f.debug_struct("Graph")
            .field("entry", &self.entry)
            .field("nodes", &names)
            .finish()
    }
}

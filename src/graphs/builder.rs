//! Fluent construction of conversation graphs.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::edges::{Edge, EdgePredicate, EdgeTarget};
use crate::node::Node;

/// Builder for conversation graphs.
///
/// Register nodes under unique names, wire each node's single outgoing edge
/// (static or conditional), pick the entry node, then
/// [`compile`](Self::compile) into an immutable
/// [`Graph`](crate::graphs::Graph). Compilation validates the topology;
/// the builder itself never fails, so construction chains fluently.
///
/// # Examples
///
/// ```
/// use threadgraph::graphs::{EdgeTarget, GraphBuilder};
/// use threadgraph::message::Message;
/// use threadgraph::node::{Node, NodeContext, NodeDelta, NodeError};
/// use threadgraph::state::StateSnapshot;
/// use async_trait::async_trait;
///
/// struct ReplyNode;
///
/// #[async_trait]
/// impl Node for ReplyNode {
///     async fn run(&self, _: StateSnapshot, _: NodeContext) -> Result<NodeDelta, NodeError> {
///         Ok(NodeDelta::new().with_messages(vec![Message::assistant("done")]))
///     }
/// }
///
/// let graph = GraphBuilder::new()
///     .add_node("reply", ReplyNode)
///     .set_entry("reply")
///     .add_edge("reply", EdgeTarget::Terminal)
///     .compile()
///     .unwrap();
///
/// assert_eq!(graph.entry(), "reply");
/// ```
pub struct GraphBuilder {
    pub(crate) nodes: FxHashMap<String, Arc<dyn Node>>,
    pub(crate) edges: FxHashMap<String, Edge>,
    pub(crate) entry: Option<String>,
    /// Names registered more than once; reported at compile time.
    pub(crate) duplicates: Vec<String>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            entry: None,
            duplicates: Vec::new(),
        }
    }

    /// Registers a node under a unique name.
    ///
    /// Registering the same name twice is a compile-time error
    /// ([`CompileError::DuplicateNode`](super::CompileError::DuplicateNode)).
    #[must_use]
    pub fn add_node(mut self, name: impl Into<String>, node: impl Node + 'static) -> Self {
        let name = name.into();
        if self.nodes.insert(name.clone(), Arc::new(node)).is_some() {
            self.duplicates.push(name);
        }
        self
    }

    /// Wires a node's static outgoing edge.
    ///
    /// `to` accepts a node name or [`EdgeTarget::Terminal`]. Re-wiring a
    /// node replaces its previous edge: a node has exactly one successor.
    #[must_use]
    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<EdgeTarget>) -> Self {
        self.edges.insert(from.into(), Edge::Static(to.into()));
        self
    }

    /// Wires a node's outgoing edge to a predicate evaluated at run time.
    ///
    /// The predicate sees the state *after* the source node's delta has been
    /// applied and returns the target to continue with. Termination of
    /// predicate-driven cycles is enforced by the runner's step bound.
    #[must_use]
    pub fn add_conditional_edge(
        mut self,
        from: impl Into<String>,
        predicate: EdgePredicate,
    ) -> Self {
        self.edges.insert(from.into(), Edge::Conditional(predicate));
        self
    }

    /// Selects the node execution starts from.
    #[must_use]
    pub fn set_entry(mut self, name: impl Into<String>) -> Self {
        self.entry = Some(name.into());
        self
    }
}

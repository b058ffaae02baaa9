//! Graph validation and compilation.
//!
//! Compilation is pure: it consumes a [`GraphBuilder`], checks the topology,
//! and produces an immutable [`Graph`] value that is safe to share across
//! concurrent runs. Everything that can be ruled out statically is ruled out
//! here; the runner re-checks the same invariants defensively at run time
//! and treats a violation there as a programming error.

use miette::Diagnostic;
use thiserror::Error;

use super::builder::GraphBuilder;
use super::edges::{Edge, EdgeTarget};
use super::Graph;

/// A structurally invalid graph definition.
///
/// Fatal at startup; a graph that fails to compile never reaches the runner.
#[derive(Debug, Error, Diagnostic)]
pub enum CompileError {
    /// No entry node was configured.
    #[error("no entry node configured")]
    #[diagnostic(
        code(threadgraph::graphs::missing_entry),
        help("Call set_entry(..) before compile().")
    )]
    MissingEntry,

    /// The configured entry node is not registered.
    #[error("entry node {entry:?} is not registered")]
    #[diagnostic(code(threadgraph::graphs::unknown_entry))]
    UnknownEntry { entry: String },

    /// A node name was registered more than once.
    #[error("node {name:?} registered more than once")]
    #[diagnostic(
        code(threadgraph::graphs::duplicate_node),
        help("Node names must be unique within a graph.")
    )]
    DuplicateNode { name: String },

    /// An edge was declared from a name with no registered node.
    #[error("edge declared from unregistered node {from:?}")]
    #[diagnostic(code(threadgraph::graphs::unknown_edge_source))]
    UnknownEdgeSource { from: String },

    /// A static edge targets a name with no registered node.
    #[error("edge from {from:?} targets unregistered node {to:?}")]
    #[diagnostic(
        code(threadgraph::graphs::unknown_edge_target),
        help("Targets must be registered nodes or EdgeTarget::Terminal.")
    )]
    UnknownEdgeTarget { from: String, to: String },

    /// A registered node has no outgoing edge.
    #[error("node {name:?} has no outgoing edge")]
    #[diagnostic(
        code(threadgraph::graphs::missing_edge),
        help("Every node needs an edge; route to EdgeTarget::Terminal to finish a run.")
    )]
    MissingEdge { name: String },
}

impl GraphBuilder {
    /// Validates the builder and produces an immutable [`Graph`].
    ///
    /// Checks, in order: duplicate node names, entry presence and
    /// registration, edge sources, static edge targets, and that every
    /// registered node has an outgoing edge. Conditional targets can only
    /// be known at run time, so they are checked by the runner when the
    /// edge is followed.
    pub fn compile(mut self) -> Result<Graph, CompileError> {
        if let Some(name) = self.duplicates.pop() {
            return Err(CompileError::DuplicateNode { name });
        }

        let entry = self.entry.ok_or(CompileError::MissingEntry)?;
        if !self.nodes.contains_key(&entry) {
            return Err(CompileError::UnknownEntry { entry });
        }

        for (from, edge) in &self.edges {
            if !self.nodes.contains_key(from) {
                return Err(CompileError::UnknownEdgeSource { from: from.clone() });
            }
            if let Edge::Static(EdgeTarget::Node(to)) = edge
                && !self.nodes.contains_key(to)
            {
                return Err(CompileError::UnknownEdgeTarget {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }

        for name in self.nodes.keys() {
            if !self.edges.contains_key(name) {
                return Err(CompileError::MissingEdge { name: name.clone() });
            }
        }

        Ok(Graph::from_parts(self.nodes, self.edges, entry))
    }
}

//! Edge types and routing predicates.

use std::fmt;
use std::sync::Arc;

use crate::state::StateSnapshot;

/// Where an edge leads: another registered node, or the terminal marker
/// that completes the run.
///
/// # Examples
///
/// ```
/// use threadgraph::graphs::EdgeTarget;
///
/// let next: EdgeTarget = "summarize".into();
/// assert!(!next.is_terminal());
/// assert!(EdgeTarget::Terminal.is_terminal());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeTarget {
    /// Continue with the named node.
    Node(String),
    /// Complete the run and return the accumulated state.
    Terminal,
}

impl EdgeTarget {
    /// Target pointing at a named node.
    #[must_use]
    pub fn node(name: impl Into<String>) -> Self {
        EdgeTarget::Node(name.into())
    }

    /// Returns true for the terminal marker.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, EdgeTarget::Terminal)
    }
}

impl From<&str> for EdgeTarget {
    fn from(name: &str) -> Self {
        EdgeTarget::Node(name.to_string())
    }
}

impl From<String> for EdgeTarget {
    fn from(name: String) -> Self {
        EdgeTarget::Node(name)
    }
}

/// Predicate for conditional routing.
///
/// Evaluated over a fresh [`StateSnapshot`] after the source node's delta
/// has been applied; the returned target decides where execution continues.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use threadgraph::graphs::{EdgePredicate, EdgeTarget};
///
/// // Loop back to the worker until it has produced an assistant reply.
/// let until_replied: EdgePredicate = Arc::new(|snapshot| {
///     if snapshot.messages.iter().any(|m| m.has_role(threadgraph::message::Role::Assistant)) {
///         EdgeTarget::Terminal
///     } else {
///         EdgeTarget::node("worker")
///     }
/// });
/// ```
pub type EdgePredicate = Arc<dyn Fn(&StateSnapshot) -> EdgeTarget + Send + Sync + 'static>;

/// The outgoing edge of a node.
///
/// Every node has exactly one: either a static single successor, or a
/// predicate choosing the successor at run time. Conditional targets are
/// validated when followed (the runner rejects unregistered nodes), and
/// termination of conditional cycles is guaranteed by the runner's step
/// bound rather than by graph shape.
#[derive(Clone)]
pub enum Edge {
    /// Fixed successor, fully validated at compile time.
    Static(EdgeTarget),
    /// Successor chosen by a predicate over the current state.
    Conditional(EdgePredicate),
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Static(target) => f.debug_tuple("Static").field(target).finish(),
            Edge::Conditional(_) => f.write_str("Conditional(<predicate>)"),
        }
    }
}

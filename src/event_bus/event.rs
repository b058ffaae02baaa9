use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a run, as observed on the bus.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunPhase {
    /// The runner accepted the input and is about to load the thread.
    Started,
    /// The run reached the terminal marker and was persisted.
    Completed { steps: u64 },
    /// The run aborted; nothing was persisted.
    Failed { detail: String },
}

/// A run-scoped lifecycle event.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunEvent {
    pub thread_id: String,
    pub phase: RunPhase,
    pub at: DateTime<Utc>,
}

/// A message emitted from inside a node via
/// [`NodeContext::emit`](crate::node::NodeContext::emit).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeEvent {
    pub node: String,
    pub step: u64,
    pub scope: String,
    pub message: String,
}

/// A free-form diagnostic not tied to a node or run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub scope: String,
    pub message: String,
}

/// Everything that flows over the event bus.
///
/// Run lifecycle events are the in-process equivalent of the
/// started/completed notifications an external message bus would carry;
/// attach a [`ChannelSink`](super::ChannelSink) to forward them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Event {
    Run(RunEvent),
    Node(NodeEvent),
    Diagnostic(DiagnosticEvent),
}

impl Event {
    /// A run has started for `thread_id`.
    pub fn run_started(thread_id: impl Into<String>) -> Self {
        Event::Run(RunEvent {
            thread_id: thread_id.into(),
            phase: RunPhase::Started,
            at: Utc::now(),
        })
    }

    /// A run completed after `steps` node executions.
    pub fn run_completed(thread_id: impl Into<String>, steps: u64) -> Self {
        Event::Run(RunEvent {
            thread_id: thread_id.into(),
            phase: RunPhase::Completed { steps },
            at: Utc::now(),
        })
    }

    /// A run aborted without persisting.
    pub fn run_failed(thread_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Event::Run(RunEvent {
            thread_id: thread_id.into(),
            phase: RunPhase::Failed {
                detail: detail.into(),
            },
            at: Utc::now(),
        })
    }

    /// A node-scoped message with node/step metadata attached.
    pub fn node_message_with_meta(
        node: impl Into<String>,
        step: u64,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Event::Node(NodeEvent {
            node: node.into(),
            step,
            scope: scope.into(),
            message: message.into(),
        })
    }

    /// A free-form diagnostic.
    pub fn diagnostic(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Event::Diagnostic(DiagnosticEvent {
            scope: scope.into(),
            message: message.into(),
        })
    }

    /// The thread this event belongs to, when it is run-scoped.
    #[must_use]
    pub fn thread_id(&self) -> Option<&str> {
        match self {
            Event::Run(run) => Some(&run.thread_id),
            _ => None,
        }
    }

    /// Coarse label used by sinks and filters.
    #[must_use]
    pub fn scope_label(&self) -> &str {
        match self {
            Event::Run(_) => "run",
            Event::Node(node) => &node.scope,
            Event::Diagnostic(diag) => &diag.scope,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Run(run) => match &run.phase {
                RunPhase::Started => write!(f, "[run] {} started", run.thread_id),
                RunPhase::Completed { steps } => {
                    write!(f, "[run] {} completed in {} steps", run.thread_id, steps)
                }
                RunPhase::Failed { detail } => {
                    write!(f, "[run] {} failed: {}", run.thread_id, detail)
                }
            },
            Event::Node(node) => write!(
                f,
                "[{}@{}] {}: {}",
                node.node, node.step, node.scope, node.message
            ),
            Event::Diagnostic(diag) => write!(f, "[{}] {}", diag.scope, diag.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_single_lines() {
        let started = Event::run_started("t1");
        assert_eq!(started.to_string(), "[run] t1 started");
        assert_eq!(started.thread_id(), Some("t1"));

        let node = Event::node_message_with_meta("reply", 2, "completion", "ok");
        assert_eq!(node.to_string(), "[reply@2] completion: ok");
        assert_eq!(node.scope_label(), "completion");
    }

    #[test]
    fn events_round_trip_through_json() {
        let event = Event::run_completed("t1", 3);
        let json = serde_json::to_string(&event).unwrap();
        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }
}

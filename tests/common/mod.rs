#![allow(dead_code)]

pub mod models;
pub mod nodes;

use std::sync::Arc;
use std::time::Duration;

use threadgraph::graphs::{EdgeTarget, Graph, GraphBuilder};
use threadgraph::runtimes::{InMemoryCheckpointer, RunnerConfig, ThreadRunner};

use self::nodes::{DelayedEchoNode, EchoNode};

/// Single-node graph: "reply" echoes the latest user message, then
/// terminates.
pub fn echo_graph() -> Graph {
    GraphBuilder::new()
        .add_node("reply", EchoNode)
        .set_entry("reply")
        .add_edge("reply", EdgeTarget::Terminal)
        .compile()
        .expect("echo graph compiles")
}

/// Echo graph whose node yields for `delay` before replying; used to force
/// overlap between concurrent runs.
pub fn delayed_echo_graph(delay: Duration) -> Graph {
    GraphBuilder::new()
        .add_node("reply", DelayedEchoNode { delay })
        .set_entry("reply")
        .add_edge("reply", EdgeTarget::Terminal)
        .compile()
        .expect("delayed echo graph compiles")
}

/// Runner over an in-memory checkpointer with the given config.
pub fn runner_with(graph: Graph, config: RunnerConfig) -> ThreadRunner {
    ThreadRunner::with_checkpointer(graph, Arc::new(InMemoryCheckpointer::new()), config)
}

/// Echo runner with default configuration.
pub fn echo_runner() -> ThreadRunner {
    runner_with(echo_graph(), RunnerConfig::default())
}

mod common;

use std::sync::Arc;

use common::nodes::NoopNode;
use common::{echo_runner, runner_with};
use threadgraph::graphs::{EdgeTarget, GraphBuilder};
use threadgraph::message::{Message, Role};
use threadgraph::model::CompletionNode;
use threadgraph::runtimes::{Checkpointer, RunnerConfig};
use threadgraph::state::ConversationState;

#[tokio::test]
async fn echo_run_creates_thread_and_replies() {
    let runner = echo_runner();
    let outcome = runner.run(Some("t1"), "hello").await.unwrap();

    assert_eq!(outcome.thread_id, "t1");
    assert_eq!(outcome.reply.as_deref(), Some("Echo: hello"));
    assert_eq!(outcome.version, 1);
    assert_eq!(outcome.steps, 1);
    assert_eq!(outcome.history.len(), 2);
    assert_eq!(outcome.history[0], Message::user("hello"));
    assert_eq!(outcome.history[1], Message::assistant("Echo: hello"));
}

#[tokio::test]
async fn second_run_resumes_history() {
    let runner = echo_runner();
    runner.run(Some("t1"), "hello").await.unwrap();
    let outcome = runner.run(Some("t1"), "again").await.unwrap();

    assert_eq!(outcome.reply.as_deref(), Some("Echo: again"));
    assert_eq!(outcome.version, 2);
    assert_eq!(outcome.history.len(), 4);
    assert_eq!(outcome.history[2], Message::user("again"));
    assert_eq!(outcome.history[3], Message::assistant("Echo: again"));
}

#[tokio::test]
async fn two_runs_match_one_run_over_seeded_history() {
    // Two sequential runs...
    let sequential = echo_runner();
    let first = sequential.run(Some("t1"), "one").await.unwrap();
    let two_runs = sequential.run(Some("t1"), "two").await.unwrap();

    // ...yield the same final history as a single run whose checkpoint
    // already contains the first exchange.
    let seeded = echo_runner();
    let seed = ConversationState::with_history("t1", first.history.clone());
    seeded.checkpointer().save(&seed, 0).await.unwrap();
    let one_run = seeded.run(Some("t1"), "two").await.unwrap();

    assert_eq!(two_runs.history, one_run.history);
    assert_eq!(two_runs.reply, one_run.reply);
}

#[tokio::test]
async fn omitted_thread_id_mints_a_fresh_thread() {
    let runner = echo_runner();
    let outcome = runner.run(None, "hi").await.unwrap();

    assert!(outcome.thread_id.starts_with("thread-"));
    assert_eq!(outcome.version, 1);

    // The echoed id resumes the same thread.
    let resumed = runner.run(Some(&outcome.thread_id), "more").await.unwrap();
    assert_eq!(resumed.history.len(), 4);
}

#[tokio::test]
async fn unknown_thread_is_absent_until_first_run() {
    let runner = echo_runner();
    let store = runner.checkpointer();

    assert!(store.load("unknown-thread").await.unwrap().is_none());

    let outcome = runner.run(Some("unknown-thread"), "hi").await.unwrap();
    assert_eq!(outcome.version, 1);

    let checkpoint = store.load("unknown-thread").await.unwrap().unwrap();
    assert_eq!(checkpoint.state.version(), 1);
    assert_eq!(checkpoint.state.messages().len(), 2);
}

#[tokio::test]
async fn threads_are_isolated() {
    let runner = echo_runner();
    runner.run(Some("a"), "for a").await.unwrap();
    runner.run(Some("b"), "for b").await.unwrap();

    let store = runner.checkpointer();
    let a = store.load("a").await.unwrap().unwrap();
    let b = store.load("b").await.unwrap().unwrap();

    assert!(a.state.messages().iter().all(|m| !m.content.contains("for b")));
    assert!(b.state.messages().iter().all(|m| !m.content.contains("for a")));
    assert_eq!(a.state.version(), 1);
    assert_eq!(b.state.version(), 1);
}

#[tokio::test]
async fn reply_is_none_when_no_assistant_message_was_produced() {
    let graph = GraphBuilder::new()
        .add_node("noop", NoopNode)
        .set_entry("noop")
        .add_edge("noop", EdgeTarget::Terminal)
        .compile()
        .unwrap();
    let runner = runner_with(graph, RunnerConfig::default());

    let outcome = runner.run(Some("t"), "hi").await.unwrap();
    assert!(outcome.reply.is_none());
    assert_eq!(outcome.history.len(), 1);
    assert_eq!(outcome.history[0].role, Role::User);
}

#[tokio::test]
async fn multi_node_chain_applies_deltas_in_order() {
    let graph = GraphBuilder::new()
        .add_node("first", common::nodes::StaticReplyNode::new("one"))
        .add_node("second", common::nodes::StaticReplyNode::new("two"))
        .set_entry("first")
        .add_edge("first", "second")
        .add_edge("second", EdgeTarget::Terminal)
        .compile()
        .unwrap();
    let runner = runner_with(graph, RunnerConfig::default());

    let outcome = runner.run(Some("t"), "go").await.unwrap();
    assert_eq!(outcome.steps, 2);
    assert_eq!(outcome.reply.as_deref(), Some("two"));
    let contents: Vec<&str> = outcome.history.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["go", "one", "two"]);
}

#[tokio::test]
async fn completion_node_replies_via_model_client() {
    let model = Arc::new(common::models::ScriptedModel::new(&["Paris.", "No."]));
    let graph = GraphBuilder::new()
        .add_node("agent", CompletionNode::new(model))
        .set_entry("agent")
        .add_edge("agent", EdgeTarget::Terminal)
        .compile()
        .unwrap();
    let runner = runner_with(graph, RunnerConfig::default());

    let first = runner.run(Some("t"), "Capital of France?").await.unwrap();
    assert_eq!(first.reply.as_deref(), Some("Paris."));

    let second = runner.run(Some("t"), "Is it big?").await.unwrap();
    assert_eq!(second.reply.as_deref(), Some("No."));
    assert_eq!(second.history.len(), 4);
    assert_eq!(second.version, 2);
}

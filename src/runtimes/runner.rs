//! The graph runner: drives a conversation run from entry to terminal.
//!
//! A [`ThreadRunner`] owns a compiled [`Graph`], a [`Checkpointer`], and an
//! event bus. It is constructed once at process start and shared by
//! reference/handle across request handlers; there is no process-global
//! state. Runs on different threads execute fully in parallel; runs on the
//! same thread are safe under the checkpoint store's optimistic versioning,
//! and can optionally be queued on an advisory per-thread lock.

use std::sync::{Arc, Mutex};

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::instrument;

use crate::event_bus::{Event, EventBus};
use crate::graphs::{Edge, EdgeTarget, Graph};
use crate::message::Message;
use crate::node::NodeContext;
use crate::runtimes::checkpointer::{
    Checkpointer, CheckpointerError, CheckpointerType, InMemoryCheckpointer,
};
use crate::runtimes::execution::{ExecutionError, NodeExecutor, RunOutcome};
use crate::runtimes::runtime_config::RunnerConfig;
use crate::state::ConversationState;
use crate::utils::id_generator::IdGenerator;

/// Errors surfaced to callers of [`ThreadRunner::run`].
///
/// Every failure aborts the run cleanly: the persisted checkpoint is left
/// exactly as it was before the run began.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// A routing inconsistency the compiler should have caught, or a
    /// conditional edge that returned an unregistered target. Always a
    /// programming error, never retried.
    #[error("malformed graph: {detail}")]
    #[diagnostic(
        code(threadgraph::runner::malformed_graph),
        help("Fix the graph definition or the offending edge predicate.")
    )]
    MalformedGraph { detail: String },

    /// The run did not reach the terminal marker within the step bound.
    #[error("run exceeded the step limit of {limit}")]
    #[diagnostic(
        code(threadgraph::runner::step_limit),
        help("A conditional cycle may not be converging; raise RunnerConfig::max_steps only if the graph is expected to loop this long.")
    )]
    StepLimitExceeded { limit: u32 },

    /// A node timed out or failed.
    #[error(transparent)]
    #[diagnostic(code(threadgraph::runner::execution))]
    Execution(#[from] ExecutionError),

    /// Checkpoint storage failed.
    #[error(transparent)]
    #[diagnostic(code(threadgraph::runner::checkpointer))]
    Checkpointer(#[from] CheckpointerError),

    /// Concurrent writers kept winning the optimistic save.
    #[error("gave up saving thread {thread_id} after {attempts} version conflicts")]
    #[diagnostic(
        code(threadgraph::runner::save_contention),
        help("Callers may retry, or queue same-thread runs with RunnerConfig::with_serialized_threads().")
    )]
    SaveContention { thread_id: String, attempts: u32 },
}

/// Drives runs of a compiled graph against persisted conversation threads.
///
/// # Examples
///
/// See the crate-level quick start; the short version:
///
/// ```no_run
/// # use threadgraph::graphs::{EdgeTarget, GraphBuilder};
/// # use threadgraph::node::{Node, NodeContext, NodeDelta, NodeError};
/// # use threadgraph::runtimes::{RunnerConfig, ThreadRunner};
/// # use threadgraph::state::StateSnapshot;
/// # use async_trait::async_trait;
/// # struct ReplyNode;
/// # #[async_trait]
/// # impl Node for ReplyNode {
/// #     async fn run(&self, _: StateSnapshot, _: NodeContext) -> Result<NodeDelta, NodeError> {
/// #         Ok(NodeDelta::default())
/// #     }
/// # }
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let graph = GraphBuilder::new()
///     .add_node("reply", ReplyNode)
///     .set_entry("reply")
///     .add_edge("reply", EdgeTarget::Terminal)
///     .compile()?;
///
/// let runner = ThreadRunner::new(graph, RunnerConfig::default()).await?;
/// let outcome = runner.run(Some("thread-1"), "hello").await?;
/// println!("{:?} (v{})", outcome.reply, outcome.version);
/// # Ok(())
/// # }
/// ```
pub struct ThreadRunner {
    graph: Arc<Graph>,
    checkpointer: Arc<dyn Checkpointer>,
    executor: NodeExecutor,
    config: RunnerConfig,
    event_bus: EventBus,
    thread_locks: Mutex<FxHashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    ids: IdGenerator,
}

impl ThreadRunner {
    /// Builds a runner, constructing the checkpoint backend selected by
    /// `config.checkpointer`.
    pub async fn new(graph: Graph, config: RunnerConfig) -> Result<Self, RunnerError> {
        let checkpointer = Self::create_checkpointer(&config).await?;
        Ok(Self::with_checkpointer(graph, checkpointer, config))
    }

    /// Builds a runner around an injected checkpoint store.
    ///
    /// Useful for sharing one store between runners and for tests.
    pub fn with_checkpointer(
        graph: Graph,
        checkpointer: Arc<dyn Checkpointer>,
        config: RunnerConfig,
    ) -> Self {
        let event_bus = config.event_bus.build_event_bus();
        event_bus.listen_for_events();
        Self {
            graph: Arc::new(graph),
            executor: NodeExecutor::new(config.node_timeout),
            checkpointer,
            event_bus,
            thread_locks: Mutex::new(FxHashMap::default()),
            ids: IdGenerator::new(),
            config,
        }
    }

    async fn create_checkpointer(
        config: &RunnerConfig,
    ) -> Result<Arc<dyn Checkpointer>, RunnerError> {
        match config.checkpointer {
            CheckpointerType::InMemory => Ok(Arc::new(InMemoryCheckpointer::new())),
            #[cfg(feature = "sqlite")]
            CheckpointerType::Sqlite => {
                let db_url = std::env::var("THREADGRAPH_SQLITE_URL")
                    .ok()
                    .or_else(|| {
                        config
                            .sqlite_db_name
                            .as_ref()
                            .map(|name| format!("sqlite://{name}"))
                    })
                    .unwrap_or_else(|| "sqlite://threadgraph.db".to_string());
                // sqlx does not create the database file; make sure it exists.
                if let Some(path) = db_url.strip_prefix("sqlite://") {
                    let path = path.trim();
                    if !path.is_empty() {
                        let p = std::path::Path::new(path);
                        if let Some(parent) = p.parent() {
                            let _ = std::fs::create_dir_all(parent);
                        }
                        if !p.exists() {
                            let _ = std::fs::File::create_new(p);
                        }
                    }
                }
                let cp = crate::runtimes::SqliteCheckpointer::connect(&db_url).await?;
                Ok(Arc::new(cp))
            }
        }
    }

    /// The compiled graph this runner executes.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Handle to the checkpoint store, e.g. for inspection or sharing.
    #[must_use]
    pub fn checkpointer(&self) -> Arc<dyn Checkpointer> {
        self.checkpointer.clone()
    }

    /// The live event bus; attach sinks here for streaming.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Runs the graph once for `input` on the given thread.
    ///
    /// With `thread_id = None` a fresh thread is minted; the id is echoed in
    /// the outcome so the caller can resume it later. An existing thread is
    /// loaded from the checkpoint store, the input appended, and the graph
    /// walked from its entry node until the terminal marker.
    ///
    /// The final state is persisted with optimistic versioning; on a version
    /// conflict the whole attempt is re-applied against the fresh state, up
    /// to `save_retries` times. Node failures and the step limit abort the
    /// run without persisting anything.
    ///
    /// Cancellation: dropping the returned future aborts in-flight work.
    /// State is only written by the single atomic save at the end, so a
    /// cancelled run leaves the checkpoint at the pre-run state.
    #[instrument(skip(self, input), err)]
    pub async fn run(
        &self,
        thread_id: Option<&str>,
        input: &str,
    ) -> Result<RunOutcome, RunnerError> {
        let thread_id = match thread_id {
            Some(id) => id.to_string(),
            None => self.ids.generate_thread_id(),
        };

        let lock = self
            .config
            .serialize_threads
            .then(|| self.thread_lock(&thread_id));
        let _guard = match &lock {
            Some(lock) => Some(lock.lock().await),
            None => None,
        };

        self.emit(Event::run_started(thread_id.as_str()));

        let mut attempts: u32 = 0;
        loop {
            match self.run_attempt(&thread_id, input).await {
                Ok(outcome) => {
                    self.emit(Event::run_completed(thread_id.as_str(), outcome.steps));
                    return Ok(outcome);
                }
                Err(RunnerError::Checkpointer(CheckpointerError::VersionConflict {
                    expected,
                    actual,
                    ..
                })) => {
                    attempts += 1;
                    if attempts > self.config.save_retries {
                        self.emit(Event::run_failed(thread_id.as_str(), "save contention"));
                        return Err(RunnerError::SaveContention {
                            thread_id,
                            attempts,
                        });
                    }
                    tracing::warn!(
                        thread_id = %thread_id,
                        expected,
                        actual,
                        attempt = attempts,
                        "checkpoint version conflict; reloading and re-applying run"
                    );
                }
                Err(e) => {
                    self.emit(Event::run_failed(thread_id.as_str(), e.to_string()));
                    return Err(e);
                }
            }
        }
    }

    /// One full load → execute → save attempt.
    async fn run_attempt(
        &self,
        thread_id: &str,
        input: &str,
    ) -> Result<RunOutcome, RunnerError> {
        let base = match self.checkpointer.load(thread_id).await? {
            Some(checkpoint) => checkpoint.state,
            None => ConversationState::new(thread_id),
        };
        let expected = base.version();
        let mut state = base.append(Message::user(input));

        let mut current = EdgeTarget::Node(self.graph.entry().to_string());
        let mut step: u64 = 0;

        while let EdgeTarget::Node(name) = current {
            if step >= u64::from(self.config.max_steps) {
                return Err(RunnerError::StepLimitExceeded {
                    limit: self.config.max_steps,
                });
            }
            let node = self
                .graph
                .node(&name)
                .ok_or_else(|| RunnerError::MalformedGraph {
                    detail: format!("no node registered under {name:?}"),
                })?;
            let ctx = NodeContext {
                node: name.clone(),
                step,
                event_sender: self.event_bus.sender(),
            };
            let delta = self
                .executor
                .execute(&name, node, state.snapshot(), ctx)
                .await?;
            state = state.apply(&delta);
            current = self.next_target(&name, &state)?;
            step += 1;
        }

        let version = self.checkpointer.save(&state, expected).await?;
        let state = state.at_version(version);
        let reply = state.last_assistant().map(|m| m.content.clone());
        Ok(RunOutcome {
            thread_id: thread_id.to_string(),
            reply,
            history: state.into_history(),
            version,
            steps: step,
        })
    }

    /// Resolves where execution continues after `from` ran.
    ///
    /// Re-checks edge and target existence even though compile() validated
    /// the static topology; a violation here means a conditional predicate
    /// routed somewhere unknown, which is fatal.
    fn next_target(
        &self,
        from: &str,
        state: &ConversationState,
    ) -> Result<EdgeTarget, RunnerError> {
        let edge = self
            .graph
            .edge(from)
            .ok_or_else(|| RunnerError::MalformedGraph {
                detail: format!("node {from:?} has no outgoing edge"),
            })?;
        let target = match edge {
            Edge::Static(target) => target.clone(),
            Edge::Conditional(predicate) => predicate(&state.snapshot()),
        };
        if let EdgeTarget::Node(name) = &target
            && self.graph.node(name).is_none()
        {
            return Err(RunnerError::MalformedGraph {
                detail: format!("edge from {from:?} routed to unregistered node {name:?}"),
            });
        }
        Ok(target)
    }

    fn thread_lock(&self, thread_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.thread_locks.lock().expect("lock registry poisoned");
        locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    fn emit(&self, event: Event) {
        // Observability only; a full channel or stopped listener must not
        // fail the run.
        let _ = self.event_bus.sender().send(event);
    }
}

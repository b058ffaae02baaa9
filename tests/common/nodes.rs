use std::time::Duration;

use async_trait::async_trait;
use threadgraph::message::Message;
use threadgraph::node::{Node, NodeContext, NodeDelta, NodeError};
use threadgraph::state::StateSnapshot;

/// Replies `Echo: <latest user message>`.
#[derive(Debug, Clone, Default)]
pub struct EchoNode;

#[async_trait]
impl Node for EchoNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodeDelta, NodeError> {
        let latest = snapshot
            .latest_user()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(NodeDelta::new().with_messages(vec![Message::assistant(format!("Echo: {latest}"))]))
    }
}

/// Echoes after yielding for `delay`; forces concurrent runs to overlap.
#[derive(Debug, Clone)]
pub struct DelayedEchoNode {
    pub delay: Duration,
}

#[async_trait]
impl Node for DelayedEchoNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodeDelta, NodeError> {
        tokio::time::sleep(self.delay).await;
        EchoNode.run(snapshot, ctx).await
    }
}

/// Replies with a fixed assistant message.
#[derive(Debug, Clone)]
pub struct StaticReplyNode {
    pub msg: &'static str,
}

impl StaticReplyNode {
    pub fn new(msg: &'static str) -> Self {
        Self { msg }
    }
}

#[async_trait]
impl Node for StaticReplyNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodeDelta, NodeError> {
        Ok(NodeDelta::new().with_messages(vec![Message::assistant(self.msg)]))
    }
}

/// Contributes nothing.
#[derive(Debug, Clone)]
pub struct NoopNode;

#[async_trait]
impl Node for NoopNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodeDelta, NodeError> {
        Ok(NodeDelta::default())
    }
}

/// Fails every time.
#[derive(Debug, Clone)]
pub struct FailingNode;

#[async_trait]
impl Node for FailingNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodeDelta, NodeError> {
        Err(NodeError::Failed("boom".to_string()))
    }
}

/// Sleeps far longer than the node timeout under test.
#[derive(Debug, Clone)]
pub struct SlowNode {
    pub delay: Duration,
}

#[async_trait]
impl Node for SlowNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodeDelta, NodeError> {
        tokio::time::sleep(self.delay).await;
        Ok(NodeDelta::default())
    }
}

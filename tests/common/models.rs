use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use threadgraph::message::Message;
use threadgraph::model::{ModelClient, ModelError};

/// Returns canned completions in order; errors once the script runs dry.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedModel {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(
        &self,
        _messages: &[Message],
        _timeout: Duration,
    ) -> Result<Message, ModelError> {
        let mut replies = self.replies.lock().expect("script poisoned");
        match replies.pop_front() {
            Some(reply) => Ok(Message::assistant(reply)),
            None => Err(ModelError::Backend {
                message: "script exhausted".to_string(),
            }),
        }
    }
}

/// Always reports rate limiting.
pub struct RateLimitedModel;

#[async_trait]
impl ModelClient for RateLimitedModel {
    async fn complete(
        &self,
        _messages: &[Message],
        _timeout: Duration,
    ) -> Result<Message, ModelError> {
        Err(ModelError::RateLimited)
    }
}

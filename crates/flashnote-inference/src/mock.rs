//! Scripted gateway for deterministic dispatch tests.
//!
//! Replies queue in FIFO order; when the queue runs dry the default
//! reply (if any) is returned, which makes "always-succeeding worker"
//! scenarios trivial to script. Every call is recorded for assertions.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use flashnote_core::{Error, Result};

use crate::gateway::{ChatMessage, ClassifierGateway, RawReply};
use crate::registry::{ConnectionConfig, Provider, WorkerDescriptor};

/// One recorded gateway invocation.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub provider: Provider,
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Default)]
pub struct MockGateway {
    replies: Mutex<VecDeque<Result<RawReply>>>,
    default_reply: Option<String>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with this content once the queue is empty.
    pub fn with_default_reply(mut self, content: impl Into<String>) -> Self {
        self.default_reply = Some(content.into());
        self
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, content: impl Into<String>) {
        self.replies
            .lock()
            .expect("mock lock")
            .push_back(Ok(RawReply {
                content: content.into(),
                reasoning: None,
            }));
    }

    /// Queue a failure.
    pub fn push_error(&self, error: Error) {
        self.replies.lock().expect("mock lock").push_back(Err(error));
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().expect("mock lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock lock").len()
    }
}

#[async_trait]
impl ClassifierGateway for MockGateway {
    async fn call(
        &self,
        worker: &WorkerDescriptor,
        _connection: &ConnectionConfig,
        messages: Vec<ChatMessage>,
    ) -> Result<RawReply> {
        self.calls.lock().expect("mock lock").push(MockCall {
            provider: worker.provider,
            model: worker.model.clone(),
            messages,
        });

        if let Some(reply) = self.replies.lock().expect("mock lock").pop_front() {
            return reply;
        }
        match &self.default_reply {
            Some(content) => Ok(RawReply {
                content: content.clone(),
                reasoning: None,
            }),
            None => Err(Error::Gateway("no scripted reply".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker() -> WorkerDescriptor {
        WorkerDescriptor::new(Provider::Zhipu, "glm-4.6", "zhipu")
    }

    fn connection() -> ConnectionConfig {
        ConnectionConfig {
            base_url: "http://test".to_string(),
            api_key: "k".to_string(),
        }
    }

    #[tokio::test]
    async fn scripted_replies_in_order() {
        let gateway = MockGateway::new();
        gateway.push_reply("first");
        gateway.push_error(Error::Gateway("down".to_string()));

        let first = gateway.call(&worker(), &connection(), vec![]).await.unwrap();
        assert_eq!(first.content, "first");

        let second = gateway.call(&worker(), &connection(), vec![]).await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn default_reply_after_queue_drains() {
        let gateway = MockGateway::new().with_default_reply("constant");
        let reply = gateway.call(&worker(), &connection(), vec![]).await.unwrap();
        assert_eq!(reply.content, "constant");
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_mock_errors() {
        let gateway = MockGateway::new();
        assert!(gateway.call(&worker(), &connection(), vec![]).await.is_err());
    }
}

//! 超时装饰器：为任意 LlmClient 的单次调用加上时限
//!
//! 不做重试：每轮对话中每次调用只尝试一次。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError};
use crate::memory::Message;

pub struct TimeoutLlmClient {
    inner: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl TimeoutLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl LlmClient for TimeoutLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        match tokio::time::timeout(self.timeout, self.inner.complete(messages)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "LLM call timed out");
                Err(LlmError::Timeout(self.timeout.as_secs()))
            }
        }
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.inner.token_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowClient;

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn complete(&self, _messages: &[Message]) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test]
    async fn test_timeout_maps_to_error() {
        let client = TimeoutLlmClient::new(Arc::new(SlowClient), Duration::from_millis(50));
        let result = client.complete(&[Message::user("hi")]).await;
        assert!(matches!(result, Err(LlmError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_passes_through_fast_reply() {
        let client = TimeoutLlmClient::new(
            Arc::new(crate::llm::MockLlmClient::with_replies(["fast"])),
            Duration::from_secs(1),
        );
        assert_eq!(client.complete(&[Message::user("hi")]).await.unwrap(), "fast");
    }
}

//! Reasoning chains produce the assistant reply for each turn.

mod prompt;

use std::time::Duration;

use async_trait::async_trait;
use auto_agent_model::{
    ModelFinishReason, ModelMessage, ModelProvider, ModelProviderError,
    ModelRequest,
};
use backoff::future::retry_notify;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

pub use crate::error::ChainError;
use crate::conversation::Message;
use crate::memory::EpisodicMemory;
use crate::model_client::ModelClient;
pub use prompt::PromptConstructor;

/// Header of the system message carrying relevant memories.
pub const MEMORY_CONTEXT_HEADER: &str =
    "This reminds you of these events from your past:";

/// Turns goals, history and memory into the next assistant reply.
#[async_trait]
pub trait ReasoningChain: Send + Sync {
    /// Produces the reply to `user_input`.
    ///
    /// `messages` is the whole conversation so far, oldest first. Errors
    /// returned from here end the run, so implementations should retry
    /// whatever they can recover from themselves.
    async fn invoke(
        &self,
        goals: &[String],
        messages: &[Message],
        memory: &dyn EpisodicMemory,
        user_input: &str,
    ) -> Result<String, ChainError>;
}

/// Retry policy for transient model failures.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Upper bound of a single delay.
    pub max_interval: Duration,
    /// Give up once this much time has passed. `None` retries forever.
    pub max_elapsed_time: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(10),
            max_elapsed_time: Some(Duration::from_secs(60)),
        }
    }
}

impl RetryConfig {
    fn to_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_max_elapsed_time(self.max_elapsed_time)
            .build()
    }
}

/// Configuration of a [`ModelChain`].
#[derive(Clone, Debug)]
pub struct ChainConfig {
    /// How many memory records to show the model.
    pub memory_top_k: usize,
    /// How many trailing history messages to send. `None` sends all.
    pub history_window: Option<usize>,
    /// Retry policy for rate-limited requests.
    pub retry: RetryConfig,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            memory_top_k: 4,
            history_window: Some(10),
            retry: RetryConfig::default(),
        }
    }
}

/// A [`ReasoningChain`] backed by a language model.
#[derive(Clone)]
pub struct ModelChain {
    client: ModelClient,
    prompt: PromptConstructor,
    config: ChainConfig,
}

impl ModelChain {
    /// Creates a chain sending requests to `provider`.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(
        provider: P,
        prompt: PromptConstructor,
    ) -> Self {
        Self::from_client(ModelClient::new(provider), prompt)
    }

    pub(crate) fn from_client(
        client: ModelClient,
        prompt: PromptConstructor,
    ) -> Self {
        Self {
            client,
            prompt,
            config: ChainConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[inline]
    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    async fn build_request(
        &self,
        goals: &[String],
        messages: &[Message],
        memory: &dyn EpisodicMemory,
        user_input: &str,
    ) -> Result<ModelRequest, ChainError> {
        let window = match self.config.history_window {
            Some(n) => &messages[messages.len().saturating_sub(n)..],
            None => messages,
        };

        let mut request_messages = vec![ModelMessage::System(
            self.prompt.construct_full_prompt(goals),
        )];

        let query = window
            .iter()
            .map(Message::content)
            .collect::<Vec<_>>()
            .join("\n");
        let records = memory.relevant(&query, self.config.memory_top_k).await?;
        if !records.is_empty() {
            trace!("recalled {} memory record(s)", records.len());
            request_messages.push(ModelMessage::System(format!(
                "{MEMORY_CONTEXT_HEADER}\n{}",
                records.join("\n")
            )));
        }

        request_messages.extend(window.iter().map(Message::to_model_message));
        request_messages.push(ModelMessage::User(user_input.to_owned()));
        Ok(ModelRequest::with_messages(request_messages))
    }
}

#[async_trait]
impl ReasoningChain for ModelChain {
    async fn invoke(
        &self,
        goals: &[String],
        messages: &[Message],
        memory: &dyn EpisodicMemory,
        user_input: &str,
    ) -> Result<String, ChainError> {
        let request = self
            .build_request(goals, messages, memory, user_input)
            .await?;

        let client = &self.client;
        let request = &request;
        let response = retry_notify(
            self.config.retry.to_backoff(),
            || async move {
                client.send_request(request.clone()).await.map_err(|err| {
                    if err.kind().is_transient() {
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            },
            |err: Box<dyn ModelProviderError>, after: Duration| {
                warn!("model request failed ({err}), retrying in {after:?}");
            },
        )
        .await
        .map_err(|err| {
            error!("model request failed for good: {err}");
            ChainError::Model(err)
        })?;

        if response.finish_reason == Some(ModelFinishReason::Length) {
            warn!("model output was truncated by the token limit");
        }
        Ok(response.transcript)
    }
}

#[cfg(test)]
mod tests {
    use auto_agent_model::ErrorKind;
    use auto_agent_test_model::{PresetResponse, TestModelProvider};

    use super::*;
    use crate::memory::InMemoryStore;

    fn fast_retry() -> ChainConfig {
        ChainConfig {
            retry: RetryConfig {
                initial_interval: Duration::from_millis(1),
                max_interval: Duration::from_millis(2),
                max_elapsed_time: Some(Duration::from_millis(200)),
            },
            ..Default::default()
        }
    }

    fn chain(provider: &TestModelProvider) -> ModelChain {
        let prompt = PromptConstructor::new("Tester", "a test agent", vec![]);
        ModelChain::new(provider.clone(), prompt).with_config(fast_retry())
    }

    #[tokio::test]
    async fn test_request_layout() {
        let mut provider = TestModelProvider::default();
        provider.add_text_response("reply");
        let memory = InMemoryStore::new();
        memory.add("Result: found rust docs".to_owned()).await.unwrap();
        memory.add("Result: nothing".to_owned()).await.unwrap();

        let mut messages = vec![];
        for i in 0..6 {
            messages.push(Message::human(format!("go {i}")));
            messages.push(Message::assistant("looking for rust"));
        }

        let goals = vec!["Learn".to_owned()];
        let reply = chain(&provider)
            .invoke(&goals, &messages, &memory, "next?")
            .await
            .unwrap();
        assert_eq!(reply, "reply");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        let sent = &requests[0].messages;
        // prompt + memories + 10 windowed messages + instruction
        assert_eq!(sent.len(), 13);
        assert!(sent[0].content().starts_with("You are Tester"));
        assert_eq!(
            sent[1],
            ModelMessage::System(format!(
                "{MEMORY_CONTEXT_HEADER}\nResult: found rust docs"
            ))
        );
        assert_eq!(sent[2], ModelMessage::User("go 1".to_owned()));
        assert_eq!(sent[12], ModelMessage::User("next?".to_owned()));
    }

    #[tokio::test]
    async fn test_no_memories_no_context_message() {
        let mut provider = TestModelProvider::default();
        provider.add_text_response("reply");
        let memory = InMemoryStore::new();

        chain(&provider)
            .invoke(&[], &[], &memory, "next?")
            .await
            .unwrap();

        let sent = &provider.requests()[0].messages;
        assert_eq!(sent.len(), 2);
        assert!(matches!(sent[0], ModelMessage::System(_)));
        assert_eq!(sent[1], ModelMessage::User("next?".to_owned()));
    }

    #[tokio::test]
    async fn test_retries_rate_limits() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::text("done").with_failures(2));
        let memory = InMemoryStore::new();

        let reply = chain(&provider)
            .invoke(&[], &[], &memory, "next?")
            .await
            .unwrap();
        assert_eq!(reply, "done");
        assert_eq!(provider.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let provider = TestModelProvider::default();
        let memory = InMemoryStore::new();

        let err = chain(&provider)
            .invoke(&[], &[], &memory, "next?")
            .await
            .unwrap_err();
        assert_eq!(err.model_error_kind(), Some(ErrorKind::Other));
        assert_eq!(provider.requests().len(), 1);
    }
}

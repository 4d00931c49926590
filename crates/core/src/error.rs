//! Failures that end a run.
//!
//! Tool failures and unparsable replies are not errors at this level: the
//! agent reports them back to the model and keeps going. What remains here
//! are failures of the infrastructure the loop stands on.

use auto_agent_model::{ErrorKind as ModelErrorKind, ModelProviderError};
use thiserror::Error;

/// The error returned by [`Agent::run`](crate::Agent::run).
#[derive(Debug, Error)]
pub enum Error {
    /// The reasoning chain could not produce a reply.
    #[error("reasoning chain failed: {0}")]
    Chain(#[from] ChainError),

    /// A memory record could not be stored.
    #[error("episodic memory failed: {0}")]
    Memory(#[from] MemoryError),

    /// The feedback gate could not be read.
    #[error("feedback gate failed: {0}")]
    Feedback(#[from] FeedbackError),

    /// The configured turn limit was hit before a finish command.
    #[error("no finish command after {0} turns")]
    TurnLimitReached(u64),
}

/// Errors from a [`ReasoningChain`](crate::chain::ReasoningChain).
#[derive(Debug, Error)]
pub enum ChainError {
    /// The model provider failed, and retrying did not help.
    #[error("model request failed: {0}")]
    Model(Box<dyn ModelProviderError>),

    /// Relevant memories could not be looked up.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// Any other failure of a custom chain.
    #[error("{0}")]
    Other(String),
}

impl ChainError {
    /// Returns the model error kind if this is a model failure.
    #[inline]
    pub fn model_error_kind(&self) -> Option<ModelErrorKind> {
        match self {
            ChainError::Model(err) => Some(err.kind()),
            _ => None,
        }
    }
}

/// Errors from an [`EpisodicMemory`](crate::memory::EpisodicMemory).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct MemoryError {
    message: String,
}

impl MemoryError {
    /// Creates an error with the given message.
    #[inline]
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors from a [`FeedbackGate`](crate::feedback::FeedbackGate).
#[derive(Debug, Error)]
pub enum FeedbackError {
    /// Reading the operator's answer failed.
    #[error("failed to read feedback: {0}")]
    Io(#[from] std::io::Error),
}

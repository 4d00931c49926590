//! Core logic of an autonomous goal-driven agent: the agent loop, reasoning
//! chains, tools, memory and human feedback.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod action;
mod agent;
pub mod chain;
pub mod conversation;
mod error;
pub mod feedback;
pub mod memory;
mod model_client;
pub mod tool;

pub use agent::{
    Agent, AgentBuilder, DEFAULT_AI_NAME, DEFAULT_AI_ROLE, FEEDBACK_PROMPT,
    USER_INPUT,
};
pub use error::{ChainError, Error, FeedbackError, MemoryError};

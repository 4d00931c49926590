//! A provider-agnostic protocol for talking to language models.
//!
//! The agent only needs a narrow slice of what a model can do: send a list
//! of role-tagged text messages and receive the assistant text back, usually
//! as a stream of deltas. This crate pins that slice down so that the core
//! crate can drive any backend (a hosted API, a local model, a scripted fake
//! for tests) without knowing which one it is talking to.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;

//! An autonomous agent that pursues goals by picking one command per turn.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library: register your own tools on an [`core::AgentBuilder`]
//! and pick any [`model::ModelProvider`].

#![deny(missing_docs)]

mod reply;

pub use reply::ReplyView;

/// Re-exports of [`auto_agent_core`] crate.
pub mod core {
    pub use auto_agent_core::*;
}

/// Re-exports of [`auto_agent_model`] crate.
pub mod model {
    pub use auto_agent_model::*;
}

/// Re-exports of [`auto_agent_openai_model`] crate.
pub mod openai {
    pub use auto_agent_openai_model::*;
}

use std::sync::Arc;

use auto_agent_model::ModelProvider;

use super::{Agent, ReplyCallback};
use crate::action::{ActionParser, JsonActionParser};
use crate::chain::{
    ChainConfig, ModelChain, PromptConstructor, ReasoningChain,
};
use crate::conversation::Conversation;
use crate::feedback::{ConsoleFeedback, FeedbackGate};
use crate::memory::{EpisodicMemory, InMemoryStore};
use crate::model_client::ModelClient;
use crate::tool::{AnyTool, Registry, Tool, ToolObject};

/// The default agent name.
pub const DEFAULT_AI_NAME: &str = "Agent";

/// The default agent role.
pub const DEFAULT_AI_ROLE: &str =
    "an autonomous assistant that pursues the given goals";

enum ChainSource {
    Custom(Box<dyn ReasoningChain>),
    Model(ModelClient),
}

/// [`Agent`] builder.
///
/// Collaborators that are not supplied get defaults: a [`JsonActionParser`],
/// an empty [`Conversation`], an [`InMemoryStore`] and no feedback gate.
pub struct AgentBuilder {
    chain: ChainSource,
    chain_config: ChainConfig,
    ai_name: String,
    ai_role: String,
    tools: Vec<Box<dyn ToolObject>>,
    memory: Option<Arc<dyn EpisodicMemory>>,
    output_parser: Option<Box<dyn ActionParser>>,
    feedback: Option<Box<dyn FeedbackGate>>,
    conversation: Conversation,
    max_turns: Option<u64>,
    on_reply: Option<ReplyCallback>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    ///
    /// The agent reasons through a [`ModelChain`] whose prompt lists the
    /// tools registered on this builder.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self::with_source(ChainSource::Model(ModelClient::new(provider)))
    }

    /// Creates a new builder with a custom reasoning chain.
    ///
    /// The chain is used as is: [`AgentBuilder::with_ai_name`],
    /// [`AgentBuilder::with_ai_role`] and [`AgentBuilder::with_chain_config`]
    /// have no effect on it.
    #[inline]
    pub fn with_chain<C: ReasoningChain + 'static>(chain: C) -> Self {
        Self::with_source(ChainSource::Custom(Box::new(chain)))
    }

    fn with_source(chain: ChainSource) -> Self {
        Self {
            chain,
            chain_config: ChainConfig::default(),
            ai_name: DEFAULT_AI_NAME.to_owned(),
            ai_role: DEFAULT_AI_ROLE.to_owned(),
            tools: vec![],
            memory: None,
            output_parser: None,
            feedback: None,
            conversation: Conversation::default(),
            max_turns: None,
            on_reply: None,
        }
    }

    /// Sets the name the agent is addressed by in the prompt.
    #[inline]
    pub fn with_ai_name<S: Into<String>>(mut self, name: S) -> Self {
        self.ai_name = name.into();
        self
    }

    /// Sets the role described in the prompt.
    #[inline]
    pub fn with_ai_role<S: Into<String>>(mut self, role: S) -> Self {
        self.ai_role = role.into();
        self
    }

    /// Sets the configuration of the model-backed chain.
    #[inline]
    pub fn with_chain_config(mut self, config: ChainConfig) -> Self {
        self.chain_config = config;
        self
    }

    /// Registers a tool.
    ///
    /// A tool registered under a name already in use replaces the earlier
    /// one.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.push(Box::new(AnyTool(tool)));
        self
    }

    /// Sets the episodic memory.
    #[inline]
    pub fn with_memory(mut self, memory: Arc<dyn EpisodicMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Sets the parser turning replies into actions.
    #[inline]
    pub fn with_output_parser<A: ActionParser + 'static>(
        mut self,
        parser: A,
    ) -> Self {
        self.output_parser = Some(Box::new(parser));
        self
    }

    /// Sets the gate consulted after every command.
    #[inline]
    pub fn with_feedback_gate<F: FeedbackGate + 'static>(
        mut self,
        gate: F,
    ) -> Self {
        self.feedback = Some(Box::new(gate));
        self
    }

    /// Enables or disables asking the operator on the terminal after every
    /// command.
    #[inline]
    pub fn human_in_the_loop(mut self, enabled: bool) -> Self {
        self.feedback = if enabled {
            Some(Box::new(ConsoleFeedback::new()))
        } else {
            None
        };
        self
    }

    /// Seeds the conversation history.
    #[inline]
    pub fn with_conversation(mut self, conversation: Conversation) -> Self {
        self.conversation = conversation;
        self
    }

    /// Limits the number of turns. Unlimited by default.
    #[inline]
    pub fn with_max_turns(mut self, max_turns: u64) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    /// Attaches a callback invoked with every assistant reply.
    #[inline]
    pub fn on_reply(
        mut self,
        on_reply: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_reply = Some(Box::new(on_reply));
        self
    }

    /// Builds the agent.
    pub fn build(self) -> Agent {
        let Self {
            chain,
            chain_config,
            ai_name,
            ai_role,
            tools,
            memory,
            output_parser,
            feedback,
            conversation,
            max_turns,
            on_reply,
        } = self;

        let tools = Registry::with_tools(tools);
        let chain: Box<dyn ReasoningChain> = match chain {
            ChainSource::Custom(chain) => chain,
            ChainSource::Model(client) => {
                let prompt = PromptConstructor::new(
                    ai_name.clone(),
                    ai_role,
                    tools.definitions(),
                );
                Box::new(
                    ModelChain::from_client(client, prompt)
                        .with_config(chain_config),
                )
            }
        };

        Agent {
            ai_name,
            chain,
            output_parser: output_parser
                .unwrap_or_else(|| Box::new(JsonActionParser)),
            tools,
            memory: memory.unwrap_or_else(|| Arc::new(InMemoryStore::new())),
            conversation,
            feedback,
            max_turns,
            on_reply,
        }
    }
}

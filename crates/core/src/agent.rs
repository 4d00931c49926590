mod builder;

use std::sync::Arc;

use tracing::Instrument;

use crate::action::{Action, ActionParser, ERROR_NAME, missing_response};
use crate::chain::ReasoningChain;
use crate::conversation::{Conversation, Message};
use crate::error::Error;
use crate::feedback::{self, EXIT_RESPONSE, FeedbackGate};
use crate::memory::EpisodicMemory;
use crate::tool::{ErrorKind as ToolErrorKind, Registry, ToolResult};
pub use builder::{AgentBuilder, DEFAULT_AI_NAME, DEFAULT_AI_ROLE};

/// The instruction sent to the reasoning chain on every turn.
pub const USER_INPUT: &str = "Determine which next command to use, and \
                              respond using the format specified above:";

/// What the feedback gate shows the operator.
pub const FEEDBACK_PROMPT: &str = "Input: ";

pub(crate) type ReplyCallback = Box<dyn Fn(&str) + Send + Sync>;

/// An autonomous agent pursuing a list of goals.
///
/// Each turn asks the reasoning chain for the next command, runs it and
/// records what happened in the conversation and in episodic memory. The
/// agent owns both for the duration of [`Agent::run`], so turns are strictly
/// sequential.
pub struct Agent {
    pub(crate) ai_name: String,
    pub(crate) chain: Box<dyn ReasoningChain>,
    pub(crate) output_parser: Box<dyn ActionParser>,
    pub(crate) tools: Registry,
    pub(crate) memory: Arc<dyn EpisodicMemory>,
    pub(crate) conversation: Conversation,
    pub(crate) feedback: Option<Box<dyn FeedbackGate>>,
    pub(crate) max_turns: Option<u64>,
    pub(crate) on_reply: Option<ReplyCallback>,
}

impl Agent {
    /// Runs until the model issues a finish command or the operator stops
    /// the agent.
    ///
    /// Returns the response of the finish command, or [`EXIT_RESPONSE`] when
    /// stopped through the feedback gate. Tool failures and malformed
    /// replies are reported back to the model and never end the run.
    pub async fn run(&mut self, goals: &[String]) -> Result<String, Error> {
        info!(
            "{} starts working on {} goal(s) with {} tool(s)",
            self.ai_name,
            goals.len(),
            self.tools.len()
        );

        let mut turn: u64 = 0;
        loop {
            if let Some(max_turns) = self.max_turns {
                if turn >= max_turns {
                    warn!("giving up after {turn} turn(s)");
                    return Err(Error::TurnLimitReached(max_turns));
                }
            }
            turn += 1;

            let outcome = self
                .run_turn(goals)
                .instrument(debug_span!("agent turn", turn))
                .await?;
            if let Some(response) = outcome {
                info!("{} stopped after {turn} turn(s)", self.ai_name);
                return Ok(response);
            }
        }
    }

    /// Returns the conversation so far.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Returns the episodic memory.
    #[inline]
    pub fn memory(&self) -> &dyn EpisodicMemory {
        &*self.memory
    }

    async fn run_turn(
        &mut self,
        goals: &[String],
    ) -> Result<Option<String>, Error> {
        let reply = self
            .chain
            .invoke(
                goals,
                self.conversation.messages(),
                &*self.memory,
                USER_INPUT,
            )
            .await?;
        trace!("assistant reply: {reply}");
        if let Some(on_reply) = &self.on_reply {
            on_reply(&reply);
        }

        self.conversation.push(Message::human(USER_INPUT));
        self.conversation.push(Message::assistant(reply.clone()));

        let mut action = self.output_parser.parse(&reply);
        if action.is_finish() {
            match action.response() {
                Some(response) => return Ok(Some(response)),
                None => {
                    warn!("finish command without a response");
                    action = missing_response();
                }
            }
        }
        let result = match action.name.as_str() {
            ERROR_NAME => {
                warn!("unusable reply: {}", action.display_args());
                format!("Error: {}.", action.display_args())
            }
            name => match self.tools.get(name) {
                Some(tool) => {
                    info!("running command {name}");
                    let tool_result = tool.execute(&action.args).await;
                    let observation = observe(&action, tool_result);
                    format!("Command {name} returned: {observation}")
                }
                None => {
                    warn!("unknown command {name:?}");
                    format!(
                        "Unknown command '{name}'. Please refer to the \
                         'COMMANDS' list for available commands and only \
                         respond in the specified JSON format."
                    )
                }
            },
        };

        let mut memory_to_add =
            format!("Assistant Reply: {reply} \nResult: {result}");
        if let Some(gate) = &self.feedback {
            let answer = gate.prompt(FEEDBACK_PROMPT).await?;
            if feedback::is_exit(&answer) {
                info!("stopped by the operator");
                return Ok(Some(EXIT_RESPONSE.to_owned()));
            }
            memory_to_add.push('\n');
            memory_to_add.push_str(&answer);
        }

        self.memory.add(memory_to_add).await?;
        debug!("turn result: {result}");
        self.conversation.push(Message::system(result));
        Ok(None)
    }
}

fn observe(action: &Action, tool_result: ToolResult) -> String {
    match tool_result {
        Ok(output) => output,
        Err(err) if err.kind() == ToolErrorKind::InvalidInput => {
            warn!("command {} rejected its arguments: {err}", action.name);
            format!(
                "Validation Error in args: {}, args: {}",
                err.reason(),
                action.display_args()
            )
        }
        Err(err) => {
            warn!("command {} failed: {err}", action.name);
            format!(
                "Error: {}, {}, args: {}",
                err.reason(),
                err.kind().name(),
                action.display_args()
            )
        }
    }
}

//! Human-in-the-loop checkpoints.

use async_trait::async_trait;
use tokio::io::{
    self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader,
    Stdin, Stdout,
};
use tokio::sync::Mutex;

pub use crate::error::FeedbackError;

/// Answers that make the agent stop right away.
pub const EXIT_SENTINELS: [&str; 2] = ["q", "stop"];

/// What [`Agent::run`](crate::Agent::run) returns when stopped by feedback.
pub const EXIT_RESPONSE: &str = "EXITING";

/// A checkpoint consulted once per turn, after the command has run.
///
/// Any answer other than one of [`EXIT_SENTINELS`] is appended to the memory
/// record of the turn.
#[async_trait]
pub trait FeedbackGate: Send + Sync {
    /// Shows `text` to the operator and waits for an answer.
    async fn prompt(&self, text: &str) -> Result<String, FeedbackError>;
}

/// Returns `true` if `feedback` asks the agent to stop.
#[inline]
pub fn is_exit(feedback: &str) -> bool {
    EXIT_SENTINELS.contains(&feedback)
}

/// A [`FeedbackGate`] reading answers from the terminal.
///
/// The answer is one line of input without its line terminator. End of input
/// counts as `q`, so a closed stdin stops the agent.
///
/// The reader lives as long as the gate. Answers typed or piped ahead of
/// time stay buffered for the following prompts.
#[derive(Debug)]
pub struct ConsoleFeedback<R = BufReader<Stdin>, W = Stdout> {
    io: Mutex<(R, W)>,
}

impl ConsoleFeedback {
    /// Creates a gate on standard input and output.
    #[inline]
    pub fn new() -> Self {
        Self::with_io(BufReader::new(io::stdin()), io::stdout())
    }
}

impl Default for ConsoleFeedback {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> ConsoleFeedback<R, W> {
    /// Creates a gate reading answers from `reader` and showing prompts on
    /// `writer`.
    #[inline]
    pub fn with_io(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }

    /// Returns the reader and the writer.
    #[inline]
    pub fn into_inner(self) -> (R, W) {
        self.io.into_inner()
    }
}

#[async_trait]
impl<R, W> FeedbackGate for ConsoleFeedback<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn prompt(&self, text: &str) -> Result<String, FeedbackError> {
        let mut io = self.io.lock().await;
        let (reader, writer) = &mut *io;
        writer.write_all(text.as_bytes()).await?;
        writer.flush().await?;

        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            debug!("input closed, treating as exit");
            return Ok(EXIT_SENTINELS[0].to_owned());
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_owned())
    }
}

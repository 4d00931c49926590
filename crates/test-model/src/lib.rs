//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use auto_agent_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new<S: Into<String>>(message: S, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: Vec<PresetEvent>,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            let idx = this.event_idx;
            this.event_idx += 1;
            if let Some(event) = this.events.get(idx) {
                return match event {
                    PresetEvent::MessageDelta(msg) => Poll::Ready(Ok(Some(
                        ModelResponseEvent::MessageDelta(msg.clone()),
                    ))),
                    PresetEvent::StreamError(msg) => Poll::Ready(Err(
                        Error::new(msg.clone(), ErrorKind::Other),
                    )),
                };
            } else if idx == this.events.len() {
                return Poll::Ready(Ok(Some(ModelResponseEvent::Completed(
                    ModelFinishReason::Stop,
                ))));
            } else {
                // In case this method is called after completion.
                return Poll::Ready(Ok(None));
            }
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

#[derive(Default)]
struct ScriptState {
    cursor: usize,
    failed_attempts: u64,
    requests: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond. Presets are consumed in the order requests arrive,
/// regardless of what the requests contain. If the script runs out, an error
/// of kind [`ErrorKind::Other`] is returned.
///
/// Clones share the script cursor and the request log, so a test can keep a
/// clone around to inspect what the agent sent after handing the provider
/// over.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Vec<PresetResponse>>,
    state: Arc<Mutex<ScriptState>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    /// Appends a response to the end of the script.
    #[inline]
    pub fn add_response(&mut self, preset: PresetResponse) {
        Arc::make_mut(&mut self.script).push(preset);
    }

    /// Appends a plain text response to the end of the script.
    #[inline]
    pub fn add_text_response<S: Into<String>>(&mut self, text: S) {
        self.add_response(PresetResponse::text(text));
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns every request received so far, failed attempts included.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.lock_state().requests.clone()
    }

    /// Returns how many presets have been served successfully.
    pub fn served(&self) -> usize {
        self.lock_state().cursor
    }

    fn lock_state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_response(
        &self,
        req: &ModelRequest,
    ) -> Result<TestModelResponse, Error> {
        let mut state = self.lock_state();
        state.requests.push(req.clone());

        let Some(preset) = self.script.get(state.cursor) else {
            return Err(Error::new("no more preset responses", ErrorKind::Other));
        };
        match preset.failures {
            Some(0) => {
                return Err(Error::new(
                    "preset always fails",
                    ErrorKind::RateLimitExceeded,
                ));
            }
            Some(failures) if state.failed_attempts < failures => {
                state.failed_attempts += 1;
                return Err(Error::new(
                    "preset failure",
                    ErrorKind::RateLimitExceeded,
                ));
            }
            _ => {}
        }
        state.cursor += 1;
        state.failed_attempts = 0;

        Ok(TestModelResponse {
            events: preset.events.clone(),
            event_idx: 0,
            delay: self.delay.unwrap_or(Duration::from_millis(1)),
            sleep: None,
        })
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        ready(self.next_response(req))
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use auto_agent_model::ModelMessage;

    use super::*;

    async fn collect_response(
        resp: TestModelResponse,
    ) -> Result<String, Error> {
        let mut resp = pin!(resp);
        let mut msg = String::new();
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await?
        {
            match event {
                ModelResponseEvent::Completed(_) => {}
                ModelResponseEvent::MessageDelta(delta) => {
                    msg.push_str(&delta);
                }
            }
        }
        Ok(msg)
    }

    fn request(text: &str) -> ModelRequest {
        ModelRequest::with_messages([ModelMessage::User(text.to_owned())])
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("Hello, ".to_owned()),
            PresetEvent::MessageDelta("world!".to_owned()),
        ]));
        provider.add_text_response("Sure, let me take a look.");
        let observer = provider.clone();

        let resp = provider.send_request(&request("Hi")).await.unwrap();
        assert_eq!(collect_response(resp).await.unwrap(), "Hello, world!");

        let resp = provider
            .send_request(&request("Check my todo"))
            .await
            .unwrap();
        assert_eq!(
            collect_response(resp).await.unwrap(),
            "Sure, let me take a look."
        );

        let err = provider.send_request(&request("More?")).await.err();
        assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::Other));

        assert_eq!(observer.served(), 2);
        let requests = observer.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1], request("Check my todo"));
    }

    #[tokio::test]
    async fn test_failures_before_success() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::text("ok").with_failures(2));

        for _ in 0..2 {
            let err = provider.send_request(&request("Hi")).await.err();
            assert_eq!(
                err.map(|e| e.kind()),
                Some(ErrorKind::RateLimitExceeded)
            );
        }
        let resp = provider.send_request(&request("Hi")).await.unwrap();
        assert_eq!(collect_response(resp).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_stream_error() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_events([
            PresetEvent::MessageDelta("partial".to_owned()),
            PresetEvent::StreamError("connection reset".to_owned()),
        ]));
        let resp = provider.send_request(&request("Hi")).await.unwrap();
        let err = collect_response(resp).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}

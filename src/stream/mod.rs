//! Cancellation-aware consumer for SSE-framed completion streams.

use std::fmt::Display;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::logger::Logger;

mod decode;
mod payload;

use decode::{SseDecoder, SseEvent};

/// Callback seam for one streaming session. Fragments arrive in decode
/// order; `on_error` fires at most once and never after cancellation;
/// `on_complete` fires only when the source ends normally.
pub trait StreamSink: Send {
    fn on_fragment(&mut self, text: &str);
    fn on_error(&mut self, message: &str);
    fn on_complete(&mut self) {}
}

/// Terminal state of a streaming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Aborted,
    Errored,
}

/// Handle to a spawned streaming session. Cancelling is idempotent and
/// suppresses every further callback from the session, including a late
/// transport error racing the cancellation.
#[derive(Debug, Clone)]
pub struct StreamHandle {
    token: CancellationToken,
}

impl StreamHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Sequential read loop for one session. Suspends at each chunk read;
/// checks the token before every read and before every callback.
pub async fn run_stream<S, E>(
    mut source: S,
    sink: &mut dyn StreamSink,
    token: CancellationToken,
    logger: &Logger,
) -> StreamOutcome
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: Display,
{
    let mut decoder = SseDecoder::new();

    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => {
                logger.info("stream", "aborted", "cancelled before next chunk");
                return StreamOutcome::Aborted;
            }
            next = source.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                match deliver(decoder.push(&chunk), sink, &token, logger) {
                    Delivery::Continue => {}
                    Delivery::Terminal(outcome) => return outcome,
                }
            }
            Some(Err(err)) => {
                if token.is_cancelled() {
                    logger.info("stream", "aborted", "cancelled; transport error suppressed");
                    return StreamOutcome::Aborted;
                }
                let message = err.to_string();
                logger.error("stream", "transport_error", &message);
                sink.on_error(&message);
                return StreamOutcome::Errored;
            }
            None => break,
        }
    }

    match deliver(decoder.finish(), sink, &token, logger) {
        Delivery::Continue => {}
        Delivery::Terminal(outcome) => return outcome,
    }

    if token.is_cancelled() {
        return StreamOutcome::Aborted;
    }
    logger.info("stream", "completed", "source ended");
    sink.on_complete();
    StreamOutcome::Completed
}

enum Delivery {
    Continue,
    Terminal(StreamOutcome),
}

fn deliver(
    events: Vec<SseEvent>,
    sink: &mut dyn StreamSink,
    token: &CancellationToken,
    logger: &Logger,
) -> Delivery {
    for event in events {
        if token.is_cancelled() {
            logger.info("stream", "aborted", "cancelled before callback");
            return Delivery::Terminal(StreamOutcome::Aborted);
        }
        match event {
            SseEvent::Fragment(text) => sink.on_fragment(&text),
            SseEvent::UpstreamError(message) => {
                logger.error("stream", "upstream_error", &message);
                sink.on_error(&message);
                return Delivery::Terminal(StreamOutcome::Errored);
            }
            SseEvent::Done => {
                logger.info("stream", "completed", "upstream done sentinel");
                sink.on_complete();
                return Delivery::Terminal(StreamOutcome::Completed);
            }
        }
    }
    Delivery::Continue
}

/// Drives `run_stream` as a background task and returns a cancel handle.
/// An optional timeout feeds the same cancellation path as `cancel`.
pub fn spawn_stream<S, E, K>(
    source: S,
    sink: K,
    timeout: Option<Duration>,
    logger: Logger,
) -> StreamHandle
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin + Send + 'static,
    E: Display + Send + 'static,
    K: StreamSink + 'static,
{
    let token = CancellationToken::new();

    if let Some(after) = timeout {
        let deadline = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            deadline.cancel();
        });
    }

    let task_token = token.clone();
    tokio::spawn(async move {
        let mut sink = sink;
        run_stream(source, &mut sink, task_token, &logger).await;
    });

    StreamHandle { token }
}

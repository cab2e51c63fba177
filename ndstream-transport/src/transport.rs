//! The streaming state machine.
//!
//! One call to [`StreamTransport::execute`] walks
//! `Idle → Connecting → Streaming → {Completed | Aborted | Failed}`:
//!
//! ```text
//! build request -> connect -> status check -> on_start
//!                                               |
//!     +-----------------------------------------+
//!     v
//! read chunk -> utf-8 -> LineFramer -> EventDecoder -> on_data / on_error
//!     |
//!     +- EOF: flush framer -> dispatch tail
//!
//! every exit -> cleanup() -> [on_error(fatal)] -> on_end()
//! ```
//!
//! Both suspension points (connecting and reading the next chunk) race the
//! request's cancellation token, so a timeout or cancel drops the pending
//! future and with it the in-flight read.

use std::time::Instant;

use futures::StreamExt;
use ndstream_types::{
    CancelReason, Outcome, StreamHandler, StreamRequest, TransportError, TransportState,
};
use tokio_util::sync::CancellationToken;

use crate::config::TransportConfig;
use crate::connector::{ByteStream, Connector, HttpConnector};
use crate::decoder::EventDecoder;
use crate::framer::{LineFramer, Utf8Decoder};
use crate::lifecycle::LifecycleController;
use crate::request;

/// Most bytes of a non-success response body kept for diagnostics.
pub const MAX_ERROR_BODY_BYTES: usize = 4096;

/// Executes streaming requests against a line-delimited JSON endpoint.
///
/// A transport holds only read-only configuration and its connector; every
/// call owns its own token and timer, so one instance can serve many
/// sequential or concurrent calls.
///
/// # Example
///
/// ```no_run
/// use ndstream_transport::{StreamTransport, TransportConfig};
/// use ndstream_types::{Callbacks, RequestOptions, StreamRequest};
///
/// # async fn run() {
/// let transport = StreamTransport::new(TransportConfig::default());
/// let request = StreamRequest::new(
///     RequestOptions::new("localhost", 11434).path("/api/chat"),
///     serde_json::json!({"model": "llama3.2", "messages": [{"role": "user", "content": "hi"}]}),
/// );
/// let mut callbacks = Callbacks::new(|event| println!("{}", event.value()));
/// let outcome = transport.execute(&request, &mut callbacks).await;
/// println!("{outcome:?}");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StreamTransport<C = HttpConnector> {
    connector: C,
    config: TransportConfig,
}

impl StreamTransport<HttpConnector> {
    /// Transport over HTTP with a default client.
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        Self::with_connector(HttpConnector::new(), config)
    }
}

impl Default for StreamTransport<HttpConnector> {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

impl<C: Connector> StreamTransport<C> {
    /// Transport over a custom connector.
    #[must_use]
    pub fn with_connector(connector: C, config: TransportConfig) -> Self {
        Self { connector, config }
    }

    /// The configuration every request runs with.
    #[must_use]
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// The connector requests are sent through.
    #[must_use]
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Execute one request, delivering its events to `handler`.
    ///
    /// `on_end` fires exactly once before this returns; a fatal error is
    /// reported through `on_error` immediately before it. The returned
    /// [`Outcome`] is the request's single terminal state.
    pub async fn execute<H: StreamHandler>(
        &self,
        request: &StreamRequest,
        handler: &mut H,
    ) -> Outcome {
        self.run(request, handler, LifecycleController::new()).await
    }

    /// Like [`execute`](Self::execute), but the request is also cancelled
    /// whenever `parent` is.
    pub async fn execute_with_parent<H: StreamHandler>(
        &self,
        request: &StreamRequest,
        handler: &mut H,
        parent: &CancellationToken,
    ) -> Outcome {
        self.run(request, handler, LifecycleController::with_parent(parent))
            .await
    }

    async fn run<H: StreamHandler>(
        &self,
        request: &StreamRequest,
        handler: &mut H,
        mut lifecycle: LifecycleController,
    ) -> Outcome {
        let started = Instant::now();
        lifecycle.start(self.config.timeout);

        let mut progress = Progress::default();
        let outcome = self
            .drive(request, handler, &lifecycle, &mut progress)
            .await;
        progress.advance(outcome.state());

        // Single exit funnel: every terminal path passes through here once.
        lifecycle.cleanup();
        if let Outcome::Failed(err) = &outcome {
            handler.on_error(err);
        }
        handler.on_end();

        let reason = match &outcome {
            Outcome::Aborted(reason) => Some(*reason),
            _ => None,
        };
        tracing::info!(
            outcome = %progress.state,
            reason = ?reason,
            bytes = progress.bytes,
            lines = progress.lines,
            events = progress.events,
            parse_errors = progress.parse_errors,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "stream finished"
        );
        outcome
    }

    async fn drive<H: StreamHandler>(
        &self,
        request: &StreamRequest,
        handler: &mut H,
        lifecycle: &LifecycleController,
        progress: &mut Progress,
    ) -> Outcome {
        let token = lifecycle.token();
        progress.advance(TransportState::Connecting);

        let wire = match request::build(&request.options, &request.body) {
            Ok(wire) => wire,
            Err(err) => return Outcome::Failed(err),
        };
        tracing::debug!(
            url = %wire.url,
            method = %wire.method,
            headers = ?wire.headers.keys().map(|name| name.as_str()).collect::<Vec<_>>(),
            body_bytes = wire.body.len(),
            "opening stream"
        );

        let connection = tokio::select! {
            biased;
            () = token.cancelled() => return aborted(lifecycle),
            result = self.connector.connect(wire) => match result {
                Ok(connection) => connection,
                Err(err) => return Outcome::Failed(err),
            },
        };

        let status = connection.status();
        let success = connection.is_success();
        let mut body = connection.into_body();
        if !success {
            // The status is already known; a cancelled body read keeps what arrived.
            let text = read_error_body(&mut body, token).await;
            tracing::warn!(status, body = %text, "endpoint rejected request");
            return Outcome::Failed(TransportError::Status { status, body: text });
        }

        progress.advance(TransportState::Streaming);
        handler.on_start(lifecycle.handle());
        if token.is_cancelled() {
            return aborted(lifecycle);
        }

        let mut utf8 = Utf8Decoder::new();
        let mut framer = LineFramer::new();
        let mut decoder = EventDecoder::new();

        loop {
            let next = tokio::select! {
                biased;
                () = token.cancelled() => return aborted(lifecycle),
                next = body.next() => next,
            };
            match next {
                Some(Ok(chunk)) => {
                    progress.bytes += chunk.len();
                    tracing::debug!(
                        bytes = chunk.len(),
                        total = progress.bytes,
                        "chunk received"
                    );
                    for line in framer.append(&utf8.decode(&chunk)) {
                        progress.dispatch(&mut decoder, &line, handler);
                        if token.is_cancelled() {
                            return aborted(lifecycle);
                        }
                    }
                }
                Some(Err(err)) => {
                    tracing::warn!(error = %err, "stream read failed");
                    return Outcome::Failed(err);
                }
                None => break,
            }
        }

        let mut tail = framer.append(&utf8.finish());
        let remainder = framer.flush();
        if !remainder.is_empty() {
            tail.push(remainder);
        }
        for line in tail {
            progress.dispatch(&mut decoder, &line, handler);
            if token.is_cancelled() {
                return aborted(lifecycle);
            }
        }
        Outcome::Completed
    }
}

fn aborted(lifecycle: &LifecycleController) -> Outcome {
    let reason = lifecycle.reason().unwrap_or(CancelReason::Cancelled);
    tracing::debug!(%reason, "stream aborted");
    Outcome::Aborted(reason)
}

async fn read_error_body(body: &mut ByteStream, token: &CancellationToken) -> String {
    let mut buf = Vec::new();
    while buf.len() < MAX_ERROR_BODY_BYTES {
        let next = tokio::select! {
            biased;
            () = token.cancelled() => break,
            next = body.next() => next,
        };
        match next {
            Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
            Some(Err(_)) | None => break,
        }
    }
    buf.truncate(MAX_ERROR_BODY_BYTES);
    String::from_utf8_lossy(&buf).into_owned()
}

/// State and counters of one request.
#[derive(Debug)]
struct Progress {
    state: TransportState,
    bytes: usize,
    lines: usize,
    events: usize,
    parse_errors: usize,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            state: TransportState::Idle,
            bytes: 0,
            lines: 0,
            events: 0,
            parse_errors: 0,
        }
    }
}

impl Progress {
    fn advance(&mut self, next: TransportState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {next}",
            self.state
        );
        tracing::debug!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }

    fn dispatch<H: StreamHandler>(
        &mut self,
        decoder: &mut EventDecoder,
        line: &str,
        handler: &mut H,
    ) {
        self.lines += 1;
        match decoder.decode(line) {
            Ok(Some(event)) => {
                self.events += 1;
                handler.on_data(event);
            }
            Ok(None) => {}
            Err(err) => {
                self.parse_errors += 1;
                tracing::warn!(
                    line = err.line_number,
                    error = %err.message,
                    "skipping malformed line"
                );
                handler.on_error(&TransportError::Parse(err));
            }
        }
    }
}

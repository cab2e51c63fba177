//! Scripted connector and recording handler for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use ndstream_types::{CancelHandle, StreamEvent, StreamHandler, TransportError};
use serde_json::Value;

use crate::connector::{Connection, Connector};
use crate::request::WireRequest;

/// One step of a scripted response body.
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Chunk(Bytes),
    Fail(&'static str),
    Sleep(Duration),
    Stall,
}

pub(crate) fn chunk(text: &str) -> Step {
    Step::Chunk(Bytes::copy_from_slice(text.as_bytes()))
}

/// How the scripted endpoint answers the connection attempt.
#[derive(Debug, Clone)]
pub(crate) enum Accept {
    Status(u16),
    Refuse,
    Stall,
}

/// A [`Connector`] that replays a fixed script.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedConnector {
    accept: Accept,
    steps: Vec<Step>,
    pub(crate) connects: Arc<AtomicUsize>,
    pub(crate) released: Arc<AtomicBool>,
    pub(crate) last_request: Arc<Mutex<Option<WireRequest>>>,
}

impl ScriptedConnector {
    pub(crate) fn new(accept: Accept, steps: Vec<Step>) -> Self {
        Self {
            accept,
            steps,
            connects: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicBool::new(false)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn ok(steps: Vec<Step>) -> Self {
        Self::new(Accept::Status(200), steps)
    }

    pub(crate) fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn body_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// Sets its flag when the body stream is dropped.
struct ReleaseFlag(Arc<AtomicBool>);

impl Drop for ReleaseFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl Connector for ScriptedConnector {
    async fn connect(&self, request: WireRequest) -> Result<Connection, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        {
            let mut last = self.last_request.lock().unwrap();
            *last = Some(request);
        }

        let status = match self.accept {
            Accept::Status(status) => status,
            Accept::Refuse => {
                let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
                return Err(TransportError::Connection(Box::new(io)));
            }
            Accept::Stall => futures::future::pending().await,
        };

        let state = (
            self.steps.iter().cloned().collect::<VecDeque<_>>(),
            ReleaseFlag(Arc::clone(&self.released)),
        );
        let body = futures::stream::unfold(state, |(mut steps, flag)| async move {
            loop {
                match steps.pop_front()? {
                    Step::Chunk(bytes) => return Some((Ok(bytes), (steps, flag))),
                    Step::Fail(msg) => {
                        return Some((Err(TransportError::Read(msg.into())), (steps, flag)));
                    }
                    Step::Sleep(duration) => tokio::time::sleep(duration).await,
                    Step::Stall => futures::future::pending::<()>().await,
                }
            }
        });
        Ok(Connection::new(status, body))
    }
}

/// What a [`Recorder`] saw, in order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Entry {
    Start,
    Data(Value),
    ParseError(usize),
    Fatal(String),
    End,
}

/// A handler that logs every callback.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub(crate) log: Vec<Entry>,
    pub(crate) handle: Arc<Mutex<Option<CancelHandle>>>,
    /// Cancel from inside `on_data` once this many events have arrived.
    pub(crate) cancel_after: Option<usize>,
}

impl Recorder {
    pub(crate) fn cancel_after(events: usize) -> Self {
        Self {
            cancel_after: Some(events),
            ..Self::default()
        }
    }

    pub(crate) fn data(&self) -> Vec<Value> {
        self.log
            .iter()
            .filter_map(|entry| match entry {
                Entry::Data(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, wanted: fn(&Entry) -> bool) -> usize {
        self.log.iter().filter(|entry| wanted(entry)).count()
    }
}

impl StreamHandler for Recorder {
    fn on_start(&mut self, cancel: CancelHandle) {
        self.log.push(Entry::Start);
        *self.handle.lock().unwrap() = Some(cancel);
    }

    fn on_data(&mut self, event: StreamEvent) {
        self.log.push(Entry::Data(event.into_value()));
        if self.cancel_after == Some(self.data().len())
            && let Some(handle) = self.handle.lock().unwrap().as_ref()
        {
            handle.cancel();
        }
    }

    fn on_end(&mut self) {
        self.log.push(Entry::End);
    }

    fn on_error(&mut self, error: &TransportError) {
        match error {
            TransportError::Parse(err) => self.log.push(Entry::ParseError(err.line_number)),
            other => self.log.push(Entry::Fatal(other.to_string())),
        }
    }
}

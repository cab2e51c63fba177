//! Callback surface for delivering a stream to its caller.

use crate::cancel::CancelHandle;
use crate::error::TransportError;
use crate::event::StreamEvent;

/// Receives the events of one request, in order.
///
/// `on_start` fires once when streaming begins, `on_data` zero or more
/// times in arrival order, `on_error` once per malformed line or fatal
/// condition, and `on_end` exactly once, last.
pub trait StreamHandler: Send {
    /// Streaming has begun; `cancel` stops the request.
    fn on_start(&mut self, cancel: CancelHandle) {
        let _ = cancel;
    }

    /// One decoded event.
    fn on_data(&mut self, event: StreamEvent);

    /// The request reached a terminal state.
    fn on_end(&mut self) {}

    /// A line failed to decode, or a fatal error ended the request.
    fn on_error(&mut self, error: &TransportError) {
        let _ = error;
    }
}

type StartFn = Box<dyn FnMut(CancelHandle) + Send>;
type DataFn = Box<dyn FnMut(StreamEvent) + Send>;
type EndFn = Box<dyn FnMut() + Send>;
type ErrorFn = Box<dyn FnMut(&TransportError) + Send>;

/// A [`StreamHandler`] assembled from closures.
///
/// ```
/// use ndstream_types::Callbacks;
///
/// let callbacks = Callbacks::new(|event| println!("{:?}", event.value()))
///     .on_end(|| println!("done"));
/// ```
pub struct Callbacks {
    start: Option<StartFn>,
    data: DataFn,
    end: Option<EndFn>,
    error: Option<ErrorFn>,
}

impl Callbacks {
    /// Create a callback set with the required data callback.
    pub fn new(on_data: impl FnMut(StreamEvent) + Send + 'static) -> Self {
        Self {
            start: None,
            data: Box::new(on_data),
            end: None,
            error: None,
        }
    }

    /// Set the start callback.
    #[must_use]
    pub fn on_start(mut self, f: impl FnMut(CancelHandle) + Send + 'static) -> Self {
        self.start = Some(Box::new(f));
        self
    }

    /// Set the end callback.
    #[must_use]
    pub fn on_end(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.end = Some(Box::new(f));
        self
    }

    /// Set the error callback.
    #[must_use]
    pub fn on_error(mut self, f: impl FnMut(&TransportError) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl StreamHandler for Callbacks {
    fn on_start(&mut self, cancel: CancelHandle) {
        if let Some(f) = self.start.as_mut() {
            f(cancel);
        }
    }

    fn on_data(&mut self, event: StreamEvent) {
        (self.data)(event);
    }

    fn on_end(&mut self) {
        if let Some(f) = self.end.as_mut() {
            f();
        }
    }

    fn on_error(&mut self, error: &TransportError) {
        if let Some(f) = self.error.as_mut() {
            f(error);
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_start", &self.start.is_some())
            .field("on_end", &self.end.is_some())
            .field("on_error", &self.error.is_some())
            .finish_non_exhaustive()
    }
}

//! Per-request cancellation token and timeout timer.

use std::time::Duration;

use ndstream_types::{CancelHandle, CancelReason};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owns the cancellation signal and the timeout timer of one request.
///
/// [`cleanup`](Self::cleanup) stops the timer and cancels the token. It runs
/// at most once, and also on drop, so an abandoned request never leaves a
/// timer behind.
#[derive(Debug, Default)]
pub struct LifecycleController {
    handle: CancelHandle,
    timer: Option<JoinHandle<()>>,
    cleaned: bool,
}

impl LifecycleController {
    /// Controller with a fresh token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller whose token is a child of `parent`.
    #[must_use]
    pub fn with_parent(parent: &CancellationToken) -> Self {
        Self {
            handle: CancelHandle::with_parent(parent),
            timer: None,
            cleaned: false,
        }
    }

    /// Arm a one-shot timer that cancels the token after `timeout`.
    ///
    /// Re-arming replaces the previous timer. Has no effect after cleanup.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&mut self, timeout: Duration) {
        if self.cleaned {
            return;
        }
        if let Some(previous) = self.timer.take() {
            previous.abort();
        }
        let handle = self.handle.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(timeout) => {
                    if handle.cancel_with(CancelReason::Timeout) {
                        tracing::debug!(
                            timeout_ms = timeout.as_millis() as u64,
                            "request timed out"
                        );
                    }
                }
                () = handle.cancelled() => {}
            }
        }));
    }

    /// Cancel on behalf of the caller. Idempotent.
    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }

    /// A handle the caller can use to cancel this request.
    #[must_use]
    pub fn handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    /// The request's token.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        self.handle.token()
    }

    /// Whether the token has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    /// Origin of the cancellation, if any.
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        self.handle.reason()
    }

    /// Whether a timer is armed and has not yet fired.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Clear the timer and cancel the token.
    ///
    /// Returns `true` the first time, `false` on every later call.
    pub fn cleanup(&mut self) -> bool {
        if self.cleaned {
            return false;
        }
        self.cleaned = true;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.handle.cancel_with(CancelReason::Finished);
        true
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        self.cleanup();
    }
}

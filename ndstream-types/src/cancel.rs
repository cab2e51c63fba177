//! Cancellation signal shared between a request and its caller.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Why a request's cancellation token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The request outlived its timeout.
    Timeout,
    /// The caller (or a parent token) asked to stop.
    Cancelled,
    /// The transport released the request after reaching a terminal state.
    Finished,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => f.write_str("timeout"),
            Self::Cancelled => f.write_str("cancelled by caller"),
            Self::Finished => f.write_str("finished"),
        }
    }
}

/// Handle for stopping one in-flight request.
///
/// Clones share the same token. The first call to [`cancel_with`](Self::cancel_with)
/// records its origin; later calls are no-ops, so a handle kept after the
/// request ended can be cancelled safely.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
    origin: Arc<OnceLock<CancelReason>>,
}

impl CancelHandle {
    /// Create a handle with a fresh token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle whose token is cancelled whenever `parent` is.
    #[must_use]
    pub fn with_parent(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
            origin: Arc::new(OnceLock::new()),
        }
    }

    /// Request cancellation on behalf of the caller.
    ///
    /// Returns `true` if this call cancelled the token.
    pub fn cancel(&self) -> bool {
        self.cancel_with(CancelReason::Cancelled)
    }

    /// Cancel with an explicit origin.
    ///
    /// Returns `true` if this call cancelled the token, `false` if it was
    /// already cancelled from any origin.
    pub fn cancel_with(&self, reason: CancelReason) -> bool {
        if self.token.is_cancelled() {
            // Cancelled through a parent token: record it as a caller cancel.
            let _ = self.origin.set(CancelReason::Cancelled);
            return false;
        }
        match self.origin.set(reason) {
            Ok(()) => {
                self.token.cancel();
                true
            }
            Err(_) => false,
        }
    }

    /// Whether the token has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The origin of the cancellation, if it has fired.
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        match self.origin.get() {
            Some(reason) => Some(*reason),
            None if self.token.is_cancelled() => Some(CancelReason::Cancelled),
            None => None,
        }
    }

    /// The underlying token, for wiring into `select!` or child tokens.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Wait until the token fires.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

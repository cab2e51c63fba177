//! Request state machine and terminal outcomes.

use std::fmt;

use crate::cancel::CancelReason;
use crate::error::TransportError;

/// Lifecycle state of one streaming request.
///
/// `Idle → Connecting → Streaming → {Completed | Aborted | Failed}`. The
/// three right-hand states are terminal and absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportState {
    /// Not started.
    Idle,
    /// Waiting for the endpoint to accept the request.
    Connecting,
    /// Reading the response body.
    Streaming,
    /// The endpoint closed the stream.
    Completed,
    /// The request was cancelled or timed out.
    Aborted,
    /// A fatal error ended the request.
    Failed,
}

impl TransportState {
    /// Whether no further transition can occur.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Failed)
    }

    /// Whether `self → next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use TransportState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Streaming)
                | (Connecting, Failed)
                | (Connecting, Aborted)
                | (Streaming, Completed)
                | (Streaming, Aborted)
                | (Streaming, Failed)
        )
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Streaming => "streaming",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// How a request ended. Exactly one is produced per request.
#[derive(Debug)]
pub enum Outcome {
    /// Upstream end-of-stream was reached and every line was dispatched.
    Completed,
    /// The cancellation token fired before the stream ended.
    Aborted(CancelReason),
    /// A fatal error ended the request.
    Failed(TransportError),
}

impl Outcome {
    /// The terminal state this outcome corresponds to.
    #[must_use]
    pub fn state(&self) -> TransportState {
        match self {
            Self::Completed => TransportState::Completed,
            Self::Aborted(_) => TransportState::Aborted,
            Self::Failed(_) => TransportState::Failed,
        }
    }

    /// Whether the stream ran to completion.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Whether the request was cancelled or timed out.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }

    /// Whether a fatal error ended the request.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Convert into a `Result`, treating cancellation as an error.
    pub fn into_result(self) -> Result<(), TransportError> {
        match self {
            Self::Completed => Ok(()),
            Self::Aborted(reason) => Err(TransportError::Cancelled(reason)),
            Self::Failed(err) => Err(err),
        }
    }
}

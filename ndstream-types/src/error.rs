//! Error taxonomy for streaming requests.

use crate::cancel::CancelReason;

/// Longest prefix of an offending line kept in a [`ParseError`].
pub const MAX_ERROR_LINE_BYTES: usize = 256;

/// Errors raised while executing a streaming request.
///
/// Pre-stream failures (`InvalidAddress`, `InvalidRequest`, `Connection`,
/// `Status`) happen before any event is delivered. `Parse` is scoped to a
/// single line and never ends the stream. `Cancelled` describes an expected
/// termination and is only produced by [`Outcome::into_result`](crate::Outcome::into_result).
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The assembled target address is not a valid absolute URL.
    #[error("invalid address {url}: {reason}")]
    InvalidAddress {
        /// The address as assembled from the request options.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The method, a header, or the body could not be turned into a request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The endpoint could not be reached.
    #[error("connection failed: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The endpoint answered with a non-success status.
    #[error("server responded with status code: {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Leading part of the response body, decoded lossily.
        body: String,
    },
    /// Reading the response body failed after streaming began.
    #[error("stream read error: {0}")]
    Read(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// One line could not be decoded as JSON.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The request was cancelled or timed out.
    #[error("cancelled: {0}")]
    Cancelled(CancelReason),
}

impl TransportError {
    /// Whether this error ends the request.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Parse(_) | Self::Cancelled(_))
    }

    /// Whether this error can only occur before streaming begins.
    #[must_use]
    pub fn is_pre_stream(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress { .. }
                | Self::InvalidRequest(_)
                | Self::Connection(_)
                | Self::Status { .. }
        )
    }
}

/// A single line of the response failed to decode as JSON.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("error parsing JSON data from event on line {line_number}: {message}")]
pub struct ParseError {
    /// 1-based position of the line in the response.
    pub line_number: usize,
    /// The offending line, truncated to [`MAX_ERROR_LINE_BYTES`].
    pub line: String,
    /// Decoder diagnostic.
    pub message: String,
}

impl ParseError {
    /// Build a parse error, truncating `line` on a char boundary.
    pub fn new(line_number: usize, line: &str, message: impl Into<String>) -> Self {
        let mut end = line.len().min(MAX_ERROR_LINE_BYTES);
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        Self {
            line_number,
            line: line[..end].to_string(),
            message: message.into(),
        }
    }
}

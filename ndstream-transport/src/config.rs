//! Configuration for a [`StreamTransport`](crate::StreamTransport).

use std::time::Duration;

/// Default upper bound on the lifetime of one request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Static configuration shared by every request a transport executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Time from `execute()` until the request is cancelled, whether or not
    /// data is still arriving.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Configuration with the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

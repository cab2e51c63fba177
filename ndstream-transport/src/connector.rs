//! The network seam: opening a connection and exposing its body as bytes.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use ndstream_types::TransportError;

use crate::request::WireRequest;

/// Response body as a stream of raw chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// An accepted request: the response status and its body.
///
/// Dropping the connection (or its body) releases the underlying socket.
pub struct Connection {
    status: u16,
    body: ByteStream,
}

impl Connection {
    /// Wrap a status and body stream.
    pub fn new(
        status: u16,
        body: impl Stream<Item = Result<Bytes, TransportError>> + Send + 'static,
    ) -> Self {
        Self {
            status,
            body: Box::pin(body),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Take the body stream.
    #[must_use]
    pub fn into_body(self) -> ByteStream {
        self.body
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Opens streaming connections.
///
/// The returned future is dropped when the request is cancelled, so an
/// implementation must release any partially established connection on
/// drop.
pub trait Connector: Send + Sync {
    /// Send `request` and resolve once response headers have arrived.
    fn connect(
        &self,
        request: WireRequest,
    ) -> impl Future<Output = Result<Connection, TransportError>> + Send;
}

/// [`Connector`] backed by a shared [`reqwest::Client`].
///
/// No client-side timeout is configured; the transport's lifecycle bounds
/// every request.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    client: reqwest::Client,
}

impl HttpConnector {
    /// Connector with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector sharing an existing client (connection pool, TLS config).
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Connector for HttpConnector {
    fn connect(
        &self,
        request: WireRequest,
    ) -> impl Future<Output = Result<Connection, TransportError>> + Send {
        let client = self.client.clone();
        async move {
            let response = client
                .request(request.method, request.url)
                .headers(request.headers)
                .body(request.body)
                .send()
                .await
                .map_err(map_send_error)?;

            let status = response.status().as_u16();
            let body = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(map_read_error));
            Ok(Connection::new(status, body))
        }
    }
}

/// Map a failure to send the request.
pub(crate) fn map_send_error(err: reqwest::Error) -> TransportError {
    if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Connection(Box::new(err))
    }
}

/// Map a failure while reading the response body.
pub(crate) fn map_read_error(err: reqwest::Error) -> TransportError {
    TransportError::Read(Box::new(err))
}

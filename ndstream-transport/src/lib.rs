#![deny(missing_docs)]
//! Cancellable, time-bounded transport for line-delimited JSON streams.
//!
//! [`StreamTransport`] sends one JSON request to a streaming endpoint (such
//! as a local Ollama server), splits the response into lines, decodes each
//! line into a [`StreamEvent`](ndstream_types::StreamEvent), and reports
//! progress through a [`StreamHandler`](ndstream_types::StreamHandler).
//! Every request is bounded by a timeout and can be cancelled at any time;
//! either way the handler's `on_end` fires exactly once.
//!
//! The building blocks are public so they can be reused on their own:
//!
//! - [`request`] builds the wire request from options and body.
//! - [`LineFramer`] and [`Utf8Decoder`] split a chunked byte stream into lines.
//! - [`EventDecoder`] turns lines into events.
//! - [`LifecycleController`] owns the per-request token and timer.
//! - [`Connector`] is the network seam; [`HttpConnector`] is the reqwest-backed default.

pub mod channel;
pub mod config;
pub mod connector;
pub mod decoder;
pub mod framer;
pub mod lifecycle;
pub mod request;
pub mod transport;

#[cfg(test)]
mod testing;

pub use channel::{EventStream, StreamItem};
pub use config::{DEFAULT_TIMEOUT, TransportConfig};
pub use connector::{ByteStream, Connection, Connector, HttpConnector};
pub use decoder::EventDecoder;
pub use framer::{LineFramer, Utf8Decoder};
pub use lifecycle::LifecycleController;
pub use request::WireRequest;
pub use transport::{MAX_ERROR_BODY_BYTES, StreamTransport};

pub use ndstream_types;

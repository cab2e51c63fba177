//! Request description: target options and body.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default protocol for a local inference endpoint.
pub const DEFAULT_PROTOCOL: &str = "http";
/// Default hostname for a local inference endpoint.
pub const DEFAULT_HOSTNAME: &str = "0.0.0.0";
/// Default port (Ollama's).
pub const DEFAULT_PORT: u16 = 11434;
/// Default HTTP verb.
pub const DEFAULT_METHOD: &str = "POST";

/// Where and how to send a streaming request.
///
/// Deserializes from partial settings: missing fields take the defaults of
/// a local Ollama endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    /// URL scheme, e.g. `http` or `https`.
    pub protocol: String,
    /// Host name or IP address.
    pub hostname: String,
    /// TCP port.
    pub port: u16,
    /// Request path, e.g. `/api/chat`.
    pub path: String,
    /// HTTP verb.
    pub method: String,
    /// Headers sent verbatim.
    pub headers: BTreeMap<String, String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.into(),
            hostname: DEFAULT_HOSTNAME.into(),
            port: DEFAULT_PORT,
            path: String::new(),
            method: DEFAULT_METHOD.into(),
            headers: BTreeMap::new(),
        }
    }
}

impl RequestOptions {
    /// Options targeting `hostname:port` with the remaining defaults.
    #[must_use]
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            ..Self::default()
        }
    }

    /// Override the URL scheme.
    #[must_use]
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Override the request path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Override the HTTP verb.
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Add or replace a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// One outbound streaming call.
///
/// `body` is sent as JSON. If it carries a `messages` list, the transport
/// removes the internal `language` field from each record before sending;
/// the request itself is never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRequest {
    /// Target and headers.
    pub options: RequestOptions,
    /// Application-defined payload.
    pub body: Value,
}

impl StreamRequest {
    /// Create a request from a ready JSON body.
    #[must_use]
    pub fn new(options: RequestOptions, body: Value) -> Self {
        Self { options, body }
    }

    /// Create a request from any serializable body.
    pub fn from_body<T: Serialize>(
        options: RequestOptions,
        body: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            options,
            body: serde_json::to_value(body)?,
        })
    }
}

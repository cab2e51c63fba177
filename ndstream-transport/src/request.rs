//! Assembly of the outgoing HTTP request from [`RequestOptions`].

use bytes::Bytes;
use ndstream_types::{RequestOptions, TransportError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde_json::Value;

/// Field carried on message records for local bookkeeping only.
const INTERNAL_MESSAGE_FIELD: &str = "language";

/// A fully assembled request, ready for a [`Connector`](crate::Connector).
#[derive(Debug, Clone)]
pub struct WireRequest {
    /// HTTP verb.
    pub method: Method,
    /// Absolute target address.
    pub url: Url,
    /// Headers, copied verbatim from the options.
    pub headers: HeaderMap,
    /// Serialized JSON body.
    pub body: Bytes,
}

/// Build the wire request for `options` and `body`.
///
/// Pure: performs no I/O. The caller's body is not modified.
pub fn build(options: &RequestOptions, body: &Value) -> Result<WireRequest, TransportError> {
    let url = target_url(options)?;

    let method = Method::from_bytes(options.method.as_bytes())
        .map_err(|e| TransportError::InvalidRequest(format!("method {:?}: {e}", options.method)))?;

    let mut headers = HeaderMap::with_capacity(options.headers.len());
    for (name, value) in &options.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::InvalidRequest(format!("header name {name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| TransportError::InvalidRequest(format!("header {name}: {e}")))?;
        headers.append(name, value);
    }

    let body = serialize_body(body)?;

    Ok(WireRequest {
        method,
        url,
        headers,
        body,
    })
}

/// Assemble `{protocol}://{hostname}:{port}{path}` and validate it.
pub fn target_url(options: &RequestOptions) -> Result<Url, TransportError> {
    let separator = if options.path.is_empty() || options.path.starts_with('/') {
        ""
    } else {
        "/"
    };
    let address = format!(
        "{}://{}:{}{}{}",
        options.protocol, options.hostname, options.port, separator, options.path
    );

    let url = Url::parse(&address).map_err(|e| TransportError::InvalidAddress {
        url: address.clone(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || url.host_str().is_none_or(str::is_empty) {
        return Err(TransportError::InvalidAddress {
            url: address,
            reason: "not an absolute address with a host".into(),
        });
    }
    Ok(url)
}

fn serialize_body(body: &Value) -> Result<Bytes, TransportError> {
    let serialized = if carries_internal_fields(body) {
        let mut stripped = body.clone();
        strip_internal_fields(&mut stripped);
        serde_json::to_vec(&stripped)
    } else {
        serde_json::to_vec(body)
    };
    serialized
        .map(Bytes::from)
        .map_err(|e| TransportError::InvalidRequest(format!("body serialization failed: {e}")))
}

fn carries_internal_fields(body: &Value) -> bool {
    body.get("messages")
        .and_then(Value::as_array)
        .is_some_and(|messages| {
            messages
                .iter()
                .any(|m| m.get(INTERNAL_MESSAGE_FIELD).is_some())
        })
}

/// Remove the internal `language` field from every record of `messages`.
///
/// Inference providers reject unknown message fields. Bodies without a
/// `messages` array, and records that are not objects, are left untouched.
pub fn strip_internal_fields(body: &mut Value) {
    if let Some(messages) = body.get_mut("messages").and_then(Value::as_array_mut) {
        for record in messages.iter_mut().filter_map(Value::as_object_mut) {
            record.remove(INTERNAL_MESSAGE_FIELD);
        }
    }
}

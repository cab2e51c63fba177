//! Decoded stream events.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One JSON document decoded from one line of the response.
///
/// No schema is imposed; Ollama chat chunks, OpenAI-compatible deltas, and
/// anything else the endpoint emits arrive unchanged. Use [`parse`](Self::parse)
/// to convert into an application type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamEvent(Value);

impl StreamEvent {
    /// Wrap a JSON value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrow the decoded value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Take ownership of the decoded value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Look up a top-level field when the event is a JSON object.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Deserialize the event into an application-specific type.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }
}

impl From<Value> for StreamEvent {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<StreamEvent> for Value {
    fn from(event: StreamEvent) -> Self {
        event.0
    }
}

//! Decoding of one framed line into a [`StreamEvent`].

use ndstream_types::{ParseError, StreamEvent};
use serde_json::Value;

/// Sentinel some OpenAI-compatible endpoints send after the last event.
const DONE_SENTINEL: &str = "[DONE]";

/// Decodes lines into events, numbering them for diagnostics.
#[derive(Debug, Default)]
pub struct EventDecoder {
    lines: usize,
}

impl EventDecoder {
    /// Create a decoder starting at line 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one line.
    ///
    /// Returns `Ok(None)` for lines that carry no event: blank keep-alive
    /// lines, SSE comments and field lines other than `data:`, and the
    /// `[DONE]` sentinel. A `data:` prefix is stripped before parsing.
    /// Malformed JSON yields a [`ParseError`] for this line only.
    pub fn decode(&mut self, line: &str) -> Result<Option<StreamEvent>, ParseError> {
        self.lines += 1;

        let trimmed = line.trim();
        let Some(payload) = payload(trimmed) else {
            return Ok(None);
        };

        serde_json::from_str::<Value>(payload)
            .map(|value| Some(StreamEvent::new(value)))
            .map_err(|e| ParseError::new(self.lines, trimmed, e.to_string()))
    }

    /// Number of lines seen so far, including ones that decoded to nothing.
    #[must_use]
    pub fn lines_seen(&self) -> usize {
        self.lines
    }
}

fn payload(line: &str) -> Option<&str> {
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    let payload = match line.strip_prefix("data:") {
        Some(rest) => rest.trim_start(),
        None if is_sse_field(line) => return None,
        None => line,
    };
    if payload.is_empty() || payload == DONE_SENTINEL {
        return None;
    }
    Some(payload)
}

fn is_sse_field(line: &str) -> bool {
    ["event:", "id:", "retry:"]
        .iter()
        .any(|field| line.starts_with(field))
}

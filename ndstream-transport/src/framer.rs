//! Incremental reassembly of response bytes into newline-delimited lines.
//!
//! Chunks arrive at arbitrary boundaries: a chunk may split a line, hold
//! many lines, or even split a multi-byte UTF-8 sequence. [`Utf8Decoder`]
//! turns bytes into text without corrupting split sequences and
//! [`LineFramer`] turns that text into complete lines.

const REPLACEMENT: char = '\u{FFFD}';

/// Streaming UTF-8 decoder.
///
/// Invalid sequences decode to U+FFFD. A sequence cut off by the end of a
/// chunk is held back until the next chunk completes it.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create a decoder with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning all text completed by it.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let joined;
        let mut input: &[u8] = if self.pending.is_empty() {
            chunk
        } else {
            let mut buf = std::mem::take(&mut self.pending);
            buf.extend_from_slice(chunk);
            joined = buf;
            &joined
        };

        let mut out = String::with_capacity(input.len());
        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            input = &rest[len..];
                        }
                        None => {
                            self.pending.extend_from_slice(rest);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// End of input: an incomplete trailing sequence becomes one U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            REPLACEMENT.to_string()
        }
    }

    /// Number of bytes held back awaiting completion.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Splits text into `\n`-terminated lines, carrying a partial line across calls.
///
/// Every byte appended comes back out exactly once: concatenating all
/// emitted lines and the final [`flush`](Self::flush) reproduces the input.
#[derive(Debug, Default)]
pub struct LineFramer {
    partial: String,
}

impl LineFramer {
    /// Create a framer with no partial line.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and return every line it completes.
    ///
    /// Returned lines keep their trailing `\n`.
    pub fn append(&mut self, fragment: &str) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = fragment;
        while let Some(pos) = rest.find('\n') {
            let (head, tail) = rest.split_at(pos + 1);
            if self.partial.is_empty() {
                lines.push(head.to_string());
            } else {
                let mut line = std::mem::take(&mut self.partial);
                line.push_str(head);
                lines.push(line);
            }
            rest = tail;
        }
        self.partial.push_str(rest);
        lines
    }

    /// Take the unterminated remainder, leaving the framer empty.
    pub fn flush(&mut self) -> String {
        std::mem::take(&mut self.partial)
    }

    /// The partial line currently held.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.partial
    }
}

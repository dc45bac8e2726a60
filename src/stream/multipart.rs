//! Boundary-delimited framing for `multipart/mixed` response bodies.
//!
//! The parser buffers decoded text chunks and emits batches of complete
//! part bodies. A part is only considered complete once its trailing
//! boundary has been seen, so arbitrary chunking of the wire bytes (keys,
//! values, or the boundary itself split across chunks) cannot produce a
//! partial JSON payload.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches the boundary token in a `multipart/mixed` content-type, quoted
/// or bare.
static BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)boundary=(?:"([^"]+)"|([^;]+))"#).unwrap());

/// Separator between a part's MIME header block and its body.
const HEADER_SEPARATOR: &str = "\r\n\r\n";

/// Extracts the effective part separator (`--<token>`) from a content-type
/// value, falling back to `---` when no boundary parameter is declared.
#[must_use]
pub(crate) fn boundary_from_content_type(content_type: &str) -> String {
    BOUNDARY_RE
        .captures(content_type)
        .and_then(|captures| captures.get(1).or_else(|| captures.get(2)))
        .map_or_else(|| "---".to_string(), |token| format!("--{}", token.as_str().trim()))
}

/// Stateful framing parser for one multipart body.
#[derive(Debug)]
pub(crate) struct MultipartParser {
    boundary: String,
    buffer: String,
    terminated: bool,
}

impl MultipartParser {
    pub(crate) fn new(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            buffer: String::new(),
            terminated: false,
        }
    }

    /// Appends one decoded text chunk and returns the batch of part bodies
    /// completed by it. The batch is empty while a part is still in flight.
    pub(crate) fn feed(&mut self, chunk: &str) -> Vec<String> {
        if self.terminated {
            return Vec::new();
        }
        self.buffer.push_str(chunk);

        let Some(last_index) = self.buffer.rfind(&self.boundary) else {
            return Vec::new();
        };

        let head = self.buffer[..last_index].to_string();
        let tail = self.buffer[last_index + self.boundary.len()..].to_string();

        let parts = head
            .split(&self.boundary)
            .filter(|segment| !segment.trim().is_empty())
            .map(Self::extract_part_body)
            .collect();

        // A trimmed tail of `--` is the terminating sentinel; an empty tail
        // just means the next part has not started arriving yet.
        if tail.trim() == "--" {
            self.buffer.clear();
            self.terminated = true;
        } else {
            self.buffer = tail;
        }

        parts
    }

    /// Strips the MIME header block from a part, returning the trimmed body.
    fn extract_part_body(segment: &str) -> String {
        match segment.find(HEADER_SEPARATOR) {
            Some(index) => segment[index + HEADER_SEPARATOR.len()..].trim().to_string(),
            None => segment.trim().to_string(),
        }
    }
}

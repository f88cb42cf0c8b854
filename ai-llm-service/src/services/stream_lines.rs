//! Line framing for streamed HTTP bodies (Ollama NDJSON, OpenAI SSE).
//!
//! Chunks from `bytes_stream` may split a line (or a multi-byte UTF-8
//! character) anywhere, so bytes are buffered until a `\n` arrives.

#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// Appends a chunk and returns every complete, non-blank line it closes.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line);
            let text = text.trim();
            if !text.is_empty() {
                lines.push(text.to_string());
            }
        }
        lines
    }

    /// Returns the trailing unterminated line, if any.
    pub(crate) fn finish(self) -> Option<String> {
        let text = String::from_utf8_lossy(&self.buf);
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Extracts the payload of an SSE `data:` line.
pub(crate) fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}

//! Server-Sent Events decoder for streamed generation responses
//!
//! Network chunks do not respect event or UTF-8 boundaries, so bytes are
//! buffered until a blank line closes an event.

/// A parsed SSE event
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SseEvent {
    pub event_type: Option<String>,
    pub data: String,
}

/// Buffered SSE decoder that handles partial chunks
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    /// Decoded text not yet terminated by a blank line
    buffer: String,
    /// Trailing bytes of a UTF-8 sequence split across chunks
    incomplete_utf8: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes into the decoder and extract complete events
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.push_bytes(chunk);

        let mut events = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let event_text: String = self.buffer.drain(..end).collect();
            self.buffer.drain(..2);
            if let Some(event) = parse_event(&event_text) {
                events.push(event);
            }
        }
        events
    }

    /// Flush whatever is left once the byte stream has ended
    pub fn finish(&mut self) -> Option<SseEvent> {
        if !self.incomplete_utf8.is_empty() {
            let tail = std::mem::take(&mut self.incomplete_utf8);
            self.buffer.push_str(&String::from_utf8_lossy(&tail));
        }
        let rest = std::mem::take(&mut self.buffer);
        parse_event(&rest)
    }

    fn push_bytes(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.incomplete_utf8);
        bytes.extend_from_slice(chunk);

        match std::str::from_utf8(&bytes) {
            Ok(text) => self.buffer.push_str(text),
            // Sequence cut off at the end of the chunk: keep the tail for next time
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                self.buffer
                    .push_str(&String::from_utf8_lossy(&bytes[..valid]));
                self.incomplete_utf8 = bytes[valid..].to_vec();
            }
            Err(e) => {
                tracing::warn!(
                    "Invalid UTF-8 in event stream at byte {}, replacing",
                    e.valid_up_to()
                );
                self.buffer.push_str(&String::from_utf8_lossy(&bytes));
            }
        }

        if self.buffer.contains('\r') {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }
    }
}

/// Parse a single SSE event block; blocks without `data:` lines yield nothing
fn parse_event(text: &str) -> Option<SseEvent> {
    let mut event_type = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value));
        } else if let Some(value) = line.strip_prefix("event:") {
            event_type = Some(value.trim().to_string());
        }
        // id:, retry: and unknown fields are ignored
    }

    if data_lines.is_empty() {
        return None;
    }

    Some(SseEvent {
        event_type,
        data: data_lines.join("\n"),
    })
}

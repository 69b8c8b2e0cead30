use super::payload::{self, Payload};

/// One decoded unit of the SSE stream, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseEvent {
    /// Content to deliver to the caller.
    Fragment(String),
    /// Payload of an `event:error` event.
    UpstreamError(String),
    /// End-of-stream sentinel from the upstream provider.
    Done,
}

/// Incremental decoder for `data:`/`event:`-framed streams.
///
/// Byte chunks arrive at arbitrary boundaries: a multi-byte UTF-8 scalar or
/// a line may be split across chunks, so both carry over between `push`
/// calls. Invalid byte sequences decay to U+FFFD, never to an error.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    utf8_carry: Vec<u8>,
    line_carry: String,
    pending_event: Option<String>,
}

impl SseDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk of bytes, returning every event completed by it.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let text = self.decode_utf8(chunk);
        let mut events = Vec::new();
        for piece in text.split_inclusive('\n') {
            if let Some(body) = piece.strip_suffix('\n') {
                let mut line = std::mem::take(&mut self.line_carry);
                line.push_str(body);
                if let Some(event) = self.handle_line(&line) {
                    events.push(event);
                }
            } else {
                self.line_carry.push_str(piece);
            }
        }
        events
    }

    /// Flushes a trailing unterminated line once the source has ended.
    pub(crate) fn finish(&mut self) -> Vec<SseEvent> {
        if !self.utf8_carry.is_empty() {
            // The stream ended mid-scalar; nothing more is coming.
            self.utf8_carry.clear();
            self.line_carry.push('\u{FFFD}');
        }
        let mut events = Vec::new();
        if !self.line_carry.is_empty() {
            let line = std::mem::take(&mut self.line_carry);
            if let Some(event) = self.handle_line(&line) {
                events.push(event);
            }
        }
        events
    }

    fn decode_utf8(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.utf8_carry);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut pos = 0;
        while pos < bytes.len() {
            match std::str::from_utf8(&bytes[pos..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    pos = bytes.len();
                }
                Err(err) => {
                    let valid_up_to = err.valid_up_to();
                    if let Ok(valid) = std::str::from_utf8(&bytes[pos..pos + valid_up_to]) {
                        out.push_str(valid);
                    }
                    match err.error_len() {
                        Some(bad) => {
                            out.push('\u{FFFD}');
                            pos += valid_up_to + bad;
                        }
                        None => {
                            // Incomplete trailing scalar: keep it for the next chunk.
                            self.utf8_carry = bytes[pos + valid_up_to..].to_vec();
                            pos = bytes.len();
                        }
                    }
                }
            }
        }
        out
    }

    fn handle_line(&mut self, line: &str) -> Option<SseEvent> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            // Blank line terminates the current event.
            self.pending_event = None;
            return None;
        }

        if let Some(rest) = trimmed.strip_prefix("data:") {
            // At most one space after the colon belongs to the framing.
            let raw = rest.strip_prefix(' ').unwrap_or(rest);
            if raw.is_empty() {
                return None;
            }
            let payload = payload::classify(raw);
            if self.pending_event.as_deref() == Some("error") {
                return Some(match payload {
                    Payload::Text(text) => SseEvent::UpstreamError(text),
                    Payload::Raw(raw) => SseEvent::UpstreamError(raw),
                    Payload::Done => SseEvent::Done,
                });
            }
            return Some(match payload {
                Payload::Text(text) => SseEvent::Fragment(text),
                Payload::Raw(raw) => SseEvent::Fragment(raw),
                Payload::Done => SseEvent::Done,
            });
        }

        if let Some(rest) = trimmed.strip_prefix("event:") {
            self.pending_event = Some(rest.trim().to_string());
            return None;
        }

        // id:, retry:, comments: not part of this contract.
        None
    }
}

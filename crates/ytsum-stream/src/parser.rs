//! Incremental server-sent event parser.
//!
//! Network chunks arrive at arbitrary boundaries, including inside a JSON
//! payload or a multi-byte UTF-8 sequence. The parser keeps a rolling buffer,
//! emits frames only for complete lines and carries the trailing partial line
//! over to the next chunk.

/// Terminal sentinel sent by the streaming endpoints.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One meaningful line of an event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// Payload of a `data:` line
    Data(String),
    /// `data: [DONE]`
    Done,
}

/// Line-buffering SSE parser.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    /// Bytes of an incomplete UTF-8 sequence at the end of the last chunk.
    pending: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk and collect the frames it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.decode_into_buffer(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            if let Some(frame) = parse_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush whatever is left once the byte stream has ended.
    pub fn finish(&mut self) -> Vec<SseFrame> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.buffer.push_str(&String::from_utf8_lossy(&rest));
        }
        let line = std::mem::take(&mut self.buffer);
        parse_line(&line).into_iter().collect()
    }

    /// Bytes buffered but not yet emitted.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len() + self.pending.len()
    }

    fn decode_into_buffer(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    return;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // valid_up_to guarantees this prefix is UTF-8
                    self.buffer.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        // Incomplete sequence at the end: wait for more bytes
                        None => {
                            self.pending = after.to_vec();
                            return;
                        }
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                    }
                }
            }
        }
    }
}

/// Interpret one complete line.
fn parse_line(line: &str) -> Option<SseFrame> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    if data.trim() == DONE_SENTINEL {
        return Some(SseFrame::Done);
    }
    Some(SseFrame::Data(data.to_string()))
}

//! Analysis Stream Frame Decoder
//!
//! Turns raw response bytes into [`StreamEvent`]s. Frames are separated by a
//! blank line (`\n\n`) and carry their JSON payload after a `data:` prefix.
//! Chunks may split frames, and multi-byte characters, at any byte offset.

use tracing::{debug, warn};

use crate::streaming::StreamEvent;

const FRAME_SEPARATOR: &str = "\n\n";
const DATA_PREFIX: &str = "data:";

/// Incremental decoder for the analysis event stream.
///
/// Feed it chunks as they arrive; it returns every event whose frame was
/// completed by that chunk. Whatever is left when the stream closes is
/// handed to [`FrameDecoder::finish`].
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    /// Decoded text not yet terminated by a frame separator.
    buffer: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the events of all frames it completed,
    /// in stream order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.decode_utf8(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.find(FRAME_SEPARATOR) {
            let frame: String = self.buffer.drain(..pos + FRAME_SEPARATOR.len()).collect();
            if let Some(event) = parse_frame(&frame[..pos]) {
                events.push(event);
            }
        }
        events
    }

    /// Parse whatever remains after the stream closed.
    ///
    /// The final frame may lack its separator, and its `data:` prefix is
    /// optional.
    pub fn finish(mut self) -> Option<StreamEvent> {
        if !self.pending.is_empty() {
            self.buffer.push_str(&String::from_utf8_lossy(&self.pending));
        }

        let rest = self.buffer.trim();
        if rest.is_empty() {
            return None;
        }
        let payload = rest.strip_prefix(DATA_PREFIX).unwrap_or(rest).trim();
        parse_payload(payload)
    }

    /// Whether undecoded text is still buffered.
    pub fn has_remainder(&self) -> bool {
        !self.pending.is_empty() || !self.buffer.trim().is_empty()
    }

    fn decode_utf8(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);

        let mut start = 0;
        loop {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    start = self.pending.len();
                    break;
                }
                Err(e) => {
                    let valid = start + e.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&self.pending[start..valid]) {
                        self.buffer.push_str(text);
                    }
                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            start = valid + len;
                        }
                        // Incomplete sequence at the end; wait for more bytes
                        None => {
                            start = valid;
                            break;
                        }
                    }
                }
            }
        }
        self.pending.drain(..start);
    }
}

fn parse_frame(frame: &str) -> Option<StreamEvent> {
    let Some(payload) = frame.strip_prefix(DATA_PREFIX) else {
        if !frame.trim().is_empty() {
            debug!(frame = %frame, "Ignoring non-data stream frame");
        }
        return None;
    };
    parse_payload(payload.trim())
}

fn parse_payload(payload: &str) -> Option<StreamEvent> {
    if payload.is_empty() {
        return None;
    }
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(error = %e, payload = %payload, "Failed to parse stream frame");
            None
        }
    }
}

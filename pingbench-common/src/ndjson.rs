//! Newline-delimited JSON framing for streamed `PingMessage`s over HTTP.

use crate::{PingBenchError, PingMessage, Result};

/// Serialize one message as a single JSON line terminated by `\n`.
pub fn encode_line(message: &PingMessage) -> Result<Vec<u8>> {
    let mut line =
        serde_json::to_vec(message).map_err(|e| PingBenchError::Decode(e.to_string()))?;
    line.push(b'\n');
    Ok(line)
}

/// Incremental decoder: feed arbitrary body chunks, get back every complete line.
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk` and decode every line it completes. Blank lines are skipped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<PingMessage>> {
        self.pending.extend_from_slice(chunk);
        let mut decoded = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(item) = decode_line(&line) {
                decoded.push(item);
            }
        }
        decoded
    }

    /// Decode a trailing line that was not newline-terminated, if any.
    pub fn finish(self) -> Option<Result<PingMessage>> {
        decode_line(&self.pending)
    }
}

fn decode_line(line: &[u8]) -> Option<Result<PingMessage>> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).map_err(|e| PingBenchError::Decode(e.to_string())))
}

use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{Participant, SessionSettings};

/// Role given to participants declared without one
pub const DEFAULT_ROLE: &str = "路人";

/// Append-only text buffer fed by a byte stream
///
/// Decoding is stateful: a multi-byte character split across two chunks is
/// held back until its remaining bytes arrive. Invalid sequences decode to
/// U+FFFD. Call [`StreamAccumulator::finish`] once the stream has ended.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    buffer: String,
    pending: Vec<u8>,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw chunk and return the updated buffer
    pub fn append(&mut self, chunk: &[u8]) -> &str {
        self.pending.extend_from_slice(chunk);
        self.decode_pending(false);
        &self.buffer
    }

    /// Flush any incomplete trailing bytes at end of stream
    pub fn finish(&mut self) -> &str {
        self.decode_pending(true);
        &self.buffer
    }

    pub fn current_text(&self) -> &str {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.pending.is_empty()
    }

    /// Drop everything, ready for a new session
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.pending.clear();
    }

    fn decode_pending(&mut self, flush: bool) {
        let mut consumed = 0;

        while consumed < self.pending.len() {
            let rest = &self.pending[consumed..];
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    consumed = self.pending.len();
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if let Ok(text) = std::str::from_utf8(&rest[..valid]) {
                        self.buffer.push_str(text);
                    }
                    consumed += valid;

                    match e.error_len() {
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            consumed += len;
                        }
                        // Incomplete sequence at the end: wait for more bytes
                        None if !flush => break,
                        None => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            consumed = self.pending.len();
                        }
                    }
                }
            }
        }

        self.pending.drain(..consumed);
    }
}

/// Load session settings from a JSON file
pub fn load_session_settings(path: &Path) -> Result<SessionSettings> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    serde_json::from_str(&content).context("Failed to parse session settings JSON")
}

/// Parse participants from a JSON file
///
/// Expected format:
/// ```json
/// [
///   {"id": "p1", "name": "王小明", "role": "工程師", "tags": ["男", "30歲"]},
///   {"id": "p2", "name": "林美華", "role": "設計師", "tags": ["女"]}
/// ]
/// ```
pub fn parse_participants_file(path: &Path) -> Result<Vec<Participant>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    let participants: Vec<Participant> =
        serde_json::from_str(&content).context("Failed to parse participants JSON")?;
    Ok(participants)
}

/// Parse participants from a comma-separated `name[:role]` list
pub fn parse_participants_string(input: &str) -> Vec<Participant> {
    input
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((name, role)) if !role.trim().is_empty() => {
                Participant::new(name.trim(), role.trim())
            }
            Some((name, _)) => Participant::new(name.trim(), DEFAULT_ROLE),
            None => Participant::new(entry, DEFAULT_ROLE),
        })
        .collect()
}

//! Streaming UTF-8 decoding for ground-state text
//!
//! Bytes may arrive split across reads, so the decoder keeps a partial
//! sequence between calls. Malformed input decodes to U+FFFD.

/// Incremental UTF-8 decoder
#[derive(Debug, Clone, Default)]
pub struct Utf8Decoder {
    buf: [u8; 4],
    len: u8,
    needed: u8,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a multi-byte sequence is in progress
    pub fn is_pending(&self) -> bool {
        self.needed > 0
    }

    /// Drop any partial sequence
    pub fn reset(&mut self) {
        self.len = 0;
        self.needed = 0;
    }

    /// Whether `byte` can continue the pending sequence
    pub fn accepts(&self, byte: u8) -> bool {
        self.is_pending() && (0x80..=0xBF).contains(&byte)
    }

    /// Feed one byte at or above 0x80, or a continuation byte.
    ///
    /// Returns the decoded character once a sequence completes. Callers
    /// must flush a pending sequence (see [`accepts`](Self::accepts))
    /// before feeding a byte that cannot continue it.
    pub fn push(&mut self, byte: u8) -> Option<char> {
        if self.is_pending() {
            self.buf[self.len as usize] = byte;
            self.len += 1;
            self.needed -= 1;
            if self.needed > 0 {
                return None;
            }
            let decoded = std::str::from_utf8(&self.buf[..self.len as usize])
                .ok()
                .and_then(|s| s.chars().next())
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            self.reset();
            return Some(decoded);
        }

        let needed = match byte {
            0x00..=0x7F => return Some(byte as char),
            0xC2..=0xDF => 1,
            0xE0..=0xEF => 2,
            0xF0..=0xF4 => 3,
            // Stray continuation, overlong lead or out of range
            _ => return Some(char::REPLACEMENT_CHARACTER),
        };
        self.buf[0] = byte;
        self.len = 1;
        self.needed = needed;
        None
    }
}

//! Parser State Machine
//!
//! Three states:
//! - Ground: bytes are written straight to the sink (UTF-8 decoded)
//! - Escape: after ESC, waiting for `[`
//! - CsiParam: collecting parameter bytes until a command byte (`A`-`z`)
//!
//! An ESC not followed by `[` is a false alarm: the buffered ESC and the
//! byte after it are written as literal output.
//!
//! The parameter buffer is bounded by [`PARAM_CAPACITY`]. A sequence that
//! would overflow it is abandoned: its bytes are discarded, the
//! overflowing byte is dropped, and the machine returns to Ground.

use tracing::{debug, trace};

use super::params::Params;
use super::sgr::Pen;
use super::sink::OutputSink;
use super::utf8::Utf8Decoder;

/// Capacity of the parameter buffer, ESC and `[` included
pub const PARAM_CAPACITY: usize = 128;

const ESC: u8 = 0x1B;

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Ground,
    Escape,
    CsiParam,
}

/// The escape sequence parser
#[derive(Debug)]
pub struct Parser {
    state: State,
    /// Bytes of the sequence in progress, starting with ESC
    buf: Vec<u8>,
    pen: Pen,
    saved_cursor: (u16, u16),
    local_echo: bool,
    utf8: Utf8Decoder,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser in the ground state with default colours and
    /// local echo on
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            buf: Vec::with_capacity(PARAM_CAPACITY),
            pen: Pen::default(),
            saved_cursor: (0, 0),
            local_echo: true,
            utf8: Utf8Decoder::new(),
        }
    }

    /// Reset the parser to its initial state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn pen(&self) -> &Pen {
        &self.pen
    }

    /// Cursor position stored by `ESC [ s`
    pub fn saved_cursor(&self) -> (u16, u16) {
        self.saved_cursor
    }

    /// Whether keyboard input should be echoed locally
    pub fn local_echo(&self) -> bool {
        self.local_echo
    }

    pub fn set_local_echo(&mut self, on: bool) {
        self.local_echo = on;
    }

    /// Process a chunk of bytes
    pub fn feed<S: OutputSink + ?Sized>(&mut self, sink: &mut S, data: &[u8]) {
        for &byte in data {
            self.advance(sink, byte);
        }
    }

    /// Process a single byte
    pub fn advance<S: OutputSink + ?Sized>(&mut self, sink: &mut S, byte: u8) {
        match self.state {
            State::Ground => self.ground(sink, byte),
            State::Escape => {
                if byte == b'[' {
                    self.buf.push(byte);
                    self.state = State::CsiParam;
                } else {
                    trace!(byte, "escape not followed by '['");
                    for &b in &self.buf {
                        sink.write(b as char);
                    }
                    self.buf.clear();
                    self.state = State::Ground;
                    if byte == ESC {
                        sink.write(ESC as char);
                    } else {
                        self.ground(sink, byte);
                    }
                }
            }
            State::CsiParam => {
                if (b'A'..=b'z').contains(&byte) {
                    self.dispatch(sink, byte);
                } else if self.buf.len() >= PARAM_CAPACITY {
                    debug!(
                        capacity = PARAM_CAPACITY,
                        "parameter buffer overflow, abandoning sequence"
                    );
                    self.buf.clear();
                    self.state = State::Ground;
                } else {
                    self.buf.push(byte);
                }
            }
        }
    }

    fn ground<S: OutputSink + ?Sized>(&mut self, sink: &mut S, byte: u8) {
        if self.utf8.is_pending() && !self.utf8.accepts(byte) {
            trace!(byte, "truncated UTF-8 sequence");
            self.utf8.reset();
            sink.write(char::REPLACEMENT_CHARACTER);
        }

        if byte == ESC {
            self.buf.clear();
            self.buf.push(byte);
            self.state = State::Escape;
            return;
        }

        if let Some(c) = self.utf8.push(byte) {
            sink.write(c);
        }
    }

    /// Run a completed sequence, then hand the pen to the sink
    fn dispatch<S: OutputSink + ?Sized>(&mut self, sink: &mut S, command: u8) {
        let buf = std::mem::take(&mut self.buf);
        // Skip ESC [
        let params = Params::parse(buf.get(2..).unwrap_or_default());
        self.execute(sink, command, &params);

        sink.set_style(self.pen.effective_fg(), self.pen.bg);
        sink.set_flags(self.pen.flags);

        self.buf = buf;
        self.buf.clear();
        self.state = State::Ground;
    }

    fn execute<S: OutputSink + ?Sized>(&mut self, sink: &mut S, command: u8, params: &Params<'_>) {
        let (width, height) = sink.size();
        let max_x = width.saturating_sub(1);
        let max_y = height.saturating_sub(1);
        let x = sink.cursor_x();
        let y = sink.cursor_y();

        match command {
            // Cursor movement
            b'A' => sink.set_cursor(x, y.saturating_sub(params.count(0))),
            b'B' => sink.set_cursor(x, y.saturating_add(params.count(0)).min(max_y)),
            b'C' => sink.set_cursor(x.saturating_add(params.count(0)).min(max_x), y),
            b'D' => sink.set_cursor(x.saturating_sub(params.count(0)), y),
            // Next / previous line: horizontal part only
            b'E' | b'F' => sink.set_cursor(0, y),
            b'G' => {
                let col = clamp_1based(params.get_or(0, 1), width);
                sink.set_cursor(col, y);
            }
            b'H' | b'f' => {
                let row = clamp_1based(params.get_or(0, 1), height);
                let col = clamp_1based(params.get_or(1, 1), width);
                sink.set_cursor(col, row);
            }
            b'd' => {
                let row = match params.get(0) {
                    None => 0,
                    Some(n) => clamp_1based(n, height),
                };
                sink.set_cursor(x, row);
            }
            b's' => self.saved_cursor = (x, y),
            b'u' => {
                let (sx, sy) = self.saved_cursor;
                sink.set_cursor(sx, sy);
            }

            // Erasing
            b'J' => sink.clear_screen(),
            b'K' => {
                let mode = params.get_or(0, 0);
                if let Ok(mode) = u16::try_from(mode) {
                    sink.erase_line(mode);
                }
            }
            b'X' => {
                for _ in 0..params.count(0) {
                    sink.write(' ');
                }
            }

            // Scrolling
            b'S' => sink.scroll_up(params.count(0)),
            b'T' => sink.scroll_down(params.count(0)),

            b'm' => self.pen.apply(params),

            // Only the alternate screen switch is understood, and only as
            // clear + home
            b'h' | b'l' => {
                if params.raw(0) == Some(b"?1049".as_slice()) {
                    sink.clear_screen();
                    sink.set_cursor(0, 0);
                }
            }

            // Local echo control
            b'z' => match params.get(0) {
                Some(1001) => self.local_echo = false,
                Some(1002) => self.local_echo = true,
                _ => {}
            },

            _ => debug!(command = %(command as char), "unknown control sequence"),
        }
    }
}

/// Convert a 1-based parameter to a 0-based coordinate in `[0, limit)`
fn clamp_1based(value: i32, limit: u16) -> u16 {
    let limit = limit.max(1) as i32;
    (value.clamp(1, limit) - 1) as u16
}

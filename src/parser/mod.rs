//! Terminal escape sequence parser
//!
//! A small byte-at-a-time state machine that drives an [`OutputSink`].
//! It understands a subset of ANSI CSI sequences plus a private
//! `ESC [ 1001 z` / `ESC [ 1002 z` local echo switch.

mod params;
mod sgr;
mod sink;
mod state;
mod utf8;

pub use params::{atoi, Params};
pub use sgr::Pen;
pub use sink::OutputSink;
pub use state::{Parser, State, PARAM_CAPACITY};
pub use utf8::Utf8Decoder;

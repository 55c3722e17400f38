//! Sumi Terminal Emulator Library
//!
//! A small graphical terminal emulator core. Bytes from a child shell run
//! through an escape parser into a cell grid, which redraws only the cells
//! that changed. Keyboard input is collected into lines before it reaches
//! the child, and a relative mouse drives a pointer overlay.
//!
//! - `core`: cells, grid, cursor and blink, the screen, snapshots
//! - `parser`: escape sequence state machine and SGR
//! - `input`: line editor, mouse tracker, host keyboard
//! - `renderer`: palette, framebuffer and host-terminal backends
//! - `event_loop`: the single-threaded polling loop
//! - `pty`: child shell on a pseudoterminal
//! - `gui`: window host (optional feature)

pub mod app;
pub mod core;
pub mod event_loop;
#[cfg(feature = "gui")]
pub mod gui;
pub mod input;
pub mod parser;
pub mod pty;
pub mod renderer;
pub mod source;
pub mod terminal;

pub use event_loop::{EventLoop, LoopError, LoopExit, LoopIo, Step};
pub use terminal::Terminal;

//! Polling event loop
//!
//! One thread, no blocking reads. Every iteration visits the sources in a
//! fixed order:
//!
//! 1. cursor blink tick
//! 2. mouse packets
//! 3. keyboard bytes, through the line editor
//! 4. child output, through the parser
//!
//! Each source is drained until it would block. A later source can be
//! delayed by a busy earlier one within an iteration, but never starved
//! across iterations.

use std::io;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::input::{
    LineEditor, MouseTracker, PacketDecoder, DEFAULT_INPUT_CAPACITY, DEFAULT_MOUSE_SCALE,
};
use crate::renderer::Renderer;
use crate::source::{ByteSource, ChildSink, ReadOutcome};
use crate::terminal::Terminal;

/// Read chunk size per source read
const READ_CHUNK: usize = 1024;

/// Idle sleep after an iteration that moved no bytes
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Nominal pixel size of one cell when no real display is attached
const NOMINAL_CELL: (u32, u32) = (8, 16);

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The child's output stream reached end of file
    ChildExited,
    /// The keyboard stream reached end of file
    KeyboardClosed,
}

/// I/O failures that end the loop
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("Failed to read child output: {0}")]
    ChildOutput(#[source] io::Error),

    #[error("Failed to write to child: {0}")]
    ChildInput(#[source] io::Error),

    #[error("Failed to read keyboard: {0}")]
    Keyboard(#[source] io::Error),
}

/// Outcome of one iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// No bytes moved
    Idle,
    /// At least one source produced bytes
    Busy,
    /// A terminating source closed
    Exit(LoopExit),
}

/// The loop's byte streams
#[derive(Debug)]
pub struct LoopIo<O, I, K, M> {
    pub child_output: O,
    pub child_input: I,
    pub keyboard: K,
    /// Dropped to `None` when the device closes or fails
    pub mouse: Option<M>,
}

impl<O, I, K, M> LoopIo<O, I, K, M> {
    pub fn new(child_output: O, child_input: I, keyboard: K, mouse: Option<M>) -> Self {
        Self {
            child_output,
            child_input,
            keyboard,
            mouse,
        }
    }
}

/// Drives a [`Terminal`] from its sources
#[derive(Debug)]
pub struct EventLoop<R> {
    terminal: Terminal<R>,
    editor: LineEditor,
    mouse: MouseTracker,
    decoder: PacketDecoder,
    tick_interval: Duration,
    buf: Vec<u8>,
}

impl<R: Renderer> EventLoop<R> {
    pub fn new(terminal: Terminal<R>) -> Self {
        let (cols, rows) = (terminal.screen().width(), terminal.screen().height());
        let display = (
            cols as u32 * NOMINAL_CELL.0,
            rows as u32 * NOMINAL_CELL.1,
        );
        Self {
            terminal,
            editor: LineEditor::new(DEFAULT_INPUT_CAPACITY),
            mouse: MouseTracker::new(display, (cols, rows), DEFAULT_MOUSE_SCALE),
            decoder: PacketDecoder::new(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            buf: vec![0; READ_CHUNK],
        }
    }

    pub fn with_input_capacity(mut self, capacity: usize) -> Self {
        self.editor = LineEditor::new(capacity);
        self
    }

    pub fn with_mouse(mut self, mouse: MouseTracker) -> Self {
        self.mouse = mouse;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn terminal(&self) -> &Terminal<R> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<R> {
        &mut self.terminal
    }

    pub fn editor(&self) -> &LineEditor {
        &self.editor
    }

    pub fn mouse(&self) -> &MouseTracker {
        &self.mouse
    }

    pub fn mouse_mut(&mut self) -> &mut MouseTracker {
        &mut self.mouse
    }

    pub fn decoder(&self) -> &PacketDecoder {
        &self.decoder
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn into_terminal(self) -> Terminal<R> {
        self.terminal
    }

    /// Move the pointer to a window pixel position
    pub fn warp_pointer(&mut self, px: f64, py: f64) {
        self.mouse.apply_warp(px, py, self.terminal.screen_mut());
    }

    /// Run one iteration
    pub fn iterate<O, I, K, M>(&mut self, io: &mut LoopIo<O, I, K, M>) -> Result<Step, LoopError>
    where
        O: ByteSource,
        I: ChildSink,
        K: ByteSource,
        M: ByteSource,
    {
        self.terminal.tick();

        let mut busy = self.drain_mouse(&mut io.mouse);

        let (keyboard_busy, keyboard_open) =
            self.drain_keyboard(&mut io.keyboard, &mut io.child_input)?;
        busy |= keyboard_busy;

        let mut exit = (!keyboard_open).then_some(LoopExit::KeyboardClosed);
        if exit.is_none() {
            let (child_busy, child_open) = self.drain_child(&mut io.child_output)?;
            busy |= child_busy;
            if !child_open {
                exit = Some(LoopExit::ChildExited);
            }
        }

        self.terminal.present();

        Ok(match exit {
            Some(exit) => Step::Exit(exit),
            None if busy => Step::Busy,
            None => Step::Idle,
        })
    }

    /// Iterate until a terminating source closes, sleeping after quiet
    /// iterations
    pub fn run<O, I, K, M>(&mut self, io: &mut LoopIo<O, I, K, M>) -> Result<LoopExit, LoopError>
    where
        O: ByteSource,
        I: ChildSink,
        K: ByteSource,
        M: ByteSource,
    {
        info!(tick_ms = self.tick_interval.as_millis() as u64, "event loop started");
        loop {
            match self.iterate(io)? {
                Step::Exit(exit) => {
                    info!(?exit, "event loop finished");
                    return Ok(exit);
                }
                Step::Idle => thread::sleep(self.tick_interval),
                Step::Busy => {}
            }
        }
    }

    fn drain_mouse<M: ByteSource>(&mut self, source: &mut Option<M>) -> bool {
        let Some(device) = source.as_mut() else {
            return false;
        };
        let mut busy = false;
        loop {
            match device.read_nonblocking(&mut self.buf) {
                Ok(ReadOutcome::Data(n)) => {
                    busy = true;
                    self.decoder.extend(&self.buf[..n]);
                    while let Some(packet) = self.decoder.next_packet() {
                        self.mouse.apply(&packet, self.terminal.screen_mut());
                    }
                }
                Ok(ReadOutcome::WouldBlock) => break,
                Ok(ReadOutcome::Closed) => {
                    warn!("mouse device closed, pointer disabled");
                    *source = None;
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "mouse device failed, pointer disabled");
                    *source = None;
                    break;
                }
            }
        }
        busy
    }

    /// Returns (bytes moved, still open)
    fn drain_keyboard<K, I>(
        &mut self,
        keyboard: &mut K,
        child: &mut I,
    ) -> Result<(bool, bool), LoopError>
    where
        K: ByteSource,
        I: ChildSink,
    {
        let mut busy = false;
        loop {
            match keyboard.read_nonblocking(&mut self.buf).map_err(LoopError::Keyboard)? {
                ReadOutcome::Data(n) => {
                    busy = true;
                    self.editor
                        .push_all(&self.buf[..n], &mut self.terminal, child)
                        .map_err(LoopError::ChildInput)?;
                }
                ReadOutcome::WouldBlock => return Ok((busy, true)),
                ReadOutcome::Closed => {
                    debug!("keyboard closed");
                    return Ok((busy, false));
                }
            }
        }
    }

    /// Returns (bytes moved, still open)
    fn drain_child<O: ByteSource>(&mut self, output: &mut O) -> Result<(bool, bool), LoopError> {
        let mut busy = false;
        loop {
            match output.read_nonblocking(&mut self.buf).map_err(LoopError::ChildOutput)? {
                ReadOutcome::Data(n) => {
                    busy = true;
                    self.terminal.feed(&self.buf[..n]);
                }
                ReadOutcome::WouldBlock => return Ok((busy, true)),
                ReadOutcome::Closed => {
                    debug!("child output closed");
                    return Ok((busy, false));
                }
            }
        }
    }
}

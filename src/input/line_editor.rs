//! Input line editing
//!
//! Keyboard bytes are collected into a bounded line buffer and sent to the
//! child a whole line at a time. Backspace edits the buffer, ETX (Ctrl-C)
//! interrupts the child, and non-printable bytes are dropped. When local
//! echo is on, accepted bytes are also fed back through the terminal so
//! the user sees what they type.

use std::io;

use tracing::trace;

use crate::source::ChildSink;

/// Default line buffer capacity in bytes
pub const DEFAULT_INPUT_CAPACITY: usize = 1024;

const BACKSPACE: u8 = 0x08;
const ETX: u8 = 0x03;
const NEWLINE: u8 = b'\n';

/// Local echo target: the terminal the editor types into
pub trait Echo {
    /// Whether local echo is currently enabled
    fn local_echo(&self) -> bool;

    /// Display one byte as if the child had printed it
    fn echo(&mut self, byte: u8);
}

/// What one input byte did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// Byte was not printable and was dropped, or backspace on an empty line
    Ignored,
    /// Byte was added to the line
    Appended,
    /// Backspace removed the last byte
    Erased,
    /// The child was interrupted
    Interrupted,
    /// The line (`n` bytes) was sent to the child and cleared
    Flushed(usize),
}

/// Bounded line buffer with editing
#[derive(Debug, Clone)]
pub struct LineEditor {
    line: Vec<u8>,
    capacity: usize,
}

impl Default for LineEditor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_CAPACITY)
    }
}

impl LineEditor {
    /// A zero capacity is treated as 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            line: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Bytes collected so far
    pub fn pending(&self) -> &[u8] {
        &self.line
    }

    pub fn len(&self) -> usize {
        self.line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Consume one keyboard byte
    pub fn push<E, C>(&mut self, byte: u8, echo: &mut E, child: &mut C) -> io::Result<Edit>
    where
        E: Echo + ?Sized,
        C: ChildSink + ?Sized,
    {
        match byte {
            BACKSPACE => {
                if self.line.pop().is_none() {
                    return Ok(Edit::Ignored);
                }
                if echo.local_echo() {
                    echo.echo(BACKSPACE);
                }
                Ok(Edit::Erased)
            }
            ETX => {
                trace!("interrupting child");
                child.interrupt()?;
                Ok(Edit::Interrupted)
            }
            NEWLINE | 0x20..=0x7E => {
                self.line.push(byte);
                if echo.local_echo() {
                    echo.echo(byte);
                }
                if byte == NEWLINE || self.line.len() >= self.capacity {
                    self.flush(child).map(Edit::Flushed)
                } else {
                    Ok(Edit::Appended)
                }
            }
            _ => Ok(Edit::Ignored),
        }
    }

    /// Feed a run of bytes, stopping at the first I/O error
    pub fn push_all<E, C>(&mut self, bytes: &[u8], echo: &mut E, child: &mut C) -> io::Result<()>
    where
        E: Echo + ?Sized,
        C: ChildSink + ?Sized,
    {
        for &byte in bytes {
            self.push(byte, echo, child)?;
        }
        Ok(())
    }

    /// Send the collected bytes to the child and clear the line
    pub fn flush<C: ChildSink + ?Sized>(&mut self, child: &mut C) -> io::Result<usize> {
        let n = self.line.len();
        child.send(&self.line)?;
        self.line.clear();
        trace!(bytes = n, "flushed input line");
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Display {
        echo: bool,
        shown: Vec<u8>,
    }

    impl Echo for Display {
        fn local_echo(&self) -> bool {
            self.echo
        }

        fn echo(&mut self, byte: u8) {
            self.shown.push(byte);
        }
    }

    #[derive(Default)]
    struct Child {
        lines: Vec<Vec<u8>>,
        interrupts: usize,
    }

    impl ChildSink for Child {
        fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.lines.push(bytes.to_vec());
            Ok(())
        }

        fn interrupt(&mut self) -> io::Result<()> {
            self.interrupts += 1;
            Ok(())
        }
    }

    fn echoing() -> Display {
        Display {
            echo: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_line_flushed_on_newline() {
        let mut editor = LineEditor::default();
        let mut display = echoing();
        let mut child = Child::default();

        editor.push_all(b"ls -l", &mut display, &mut child).unwrap();
        assert!(child.lines.is_empty());
        assert_eq!(editor.pending(), b"ls -l");

        let edit = editor.push(b'\n', &mut display, &mut child).unwrap();
        assert_eq!(edit, Edit::Flushed(6));
        assert_eq!(child.lines, vec![b"ls -l\n".to_vec()]);
        assert!(editor.is_empty());
        assert_eq!(display.shown, b"ls -l\n");
    }

    #[test]
    fn test_backspace() {
        let mut editor = LineEditor::default();
        let mut display = echoing();
        let mut child = Child::default();

        editor.push_all(b"ab\x08", &mut display, &mut child).unwrap();
        assert_eq!(editor.pending(), b"a");
        assert_eq!(display.shown, b"ab\x08");

        editor.push_all(b"\x08\x08", &mut display, &mut child).unwrap();
        assert!(editor.is_empty());
        // Backspace on an empty line is not echoed
        assert_eq!(display.shown, b"ab\x08\x08");
    }

    #[test]
    fn test_interrupt_leaves_buffer() {
        let mut editor = LineEditor::default();
        let mut display = echoing();
        let mut child = Child::default();

        editor.push_all(b"sleep", &mut display, &mut child).unwrap();
        let edit = editor.push(0x03, &mut display, &mut child).unwrap();
        assert_eq!(edit, Edit::Interrupted);
        assert_eq!(child.interrupts, 1);
        assert_eq!(editor.pending(), b"sleep");
    }

    #[test]
    fn test_non_printable_dropped() {
        let mut editor = LineEditor::default();
        let mut display = echoing();
        let mut child = Child::default();

        for byte in [0x00, 0x01, 0x09, 0x0B, 0x0D, 0x1B, 0x1F, 0x7F, 0x80, 0xFF] {
            assert_eq!(editor.push(byte, &mut display, &mut child).unwrap(), Edit::Ignored);
        }
        assert!(editor.is_empty());
        assert!(display.shown.is_empty());
    }

    #[test]
    fn test_no_echo_when_disabled() {
        let mut editor = LineEditor::default();
        let mut display = Display::default();
        let mut child = Child::default();

        editor.push_all(b"secret\n", &mut display, &mut child).unwrap();
        assert!(display.shown.is_empty());
        assert_eq!(child.lines, vec![b"secret\n".to_vec()]);
    }

    #[test]
    fn test_force_flush_at_capacity() {
        let mut editor = LineEditor::new(1024);
        let mut display = echoing();
        let mut child = Child::default();

        editor
            .push_all(&[b'x'; 1024], &mut display, &mut child)
            .unwrap();
        assert_eq!(child.lines.len(), 1);
        assert_eq!(child.lines[0].len(), 1024);
        assert!(editor.is_empty());
    }
}

//! The capability the escape machine drives
//!
//! The parser never touches a grid directly. Whatever owns the grid and
//! cursor implements [`OutputSink`]; the parser holds it only for the
//! duration of a `feed` call.

use crate::core::CellFlags;

/// Terminal output sink: cursor, style and cell mutation
///
/// Implementations must keep the cursor inside `size()` after every call.
pub trait OutputSink {
    /// Write a character at the cursor and advance (direct write path)
    fn write(&mut self, c: char);

    /// Set the colours used by subsequent writes
    fn set_style(&mut self, fg: u8, bg: u8);

    /// Set the style flags used by subsequent writes
    fn set_flags(&mut self, flags: CellFlags);

    /// Move the cursor; out-of-range values are clamped
    fn set_cursor(&mut self, x: u16, y: u16);

    fn cursor_x(&self) -> u16;

    fn cursor_y(&self) -> u16;

    /// Store `c` at (`x`, `y`) in the current colours without moving the cursor
    fn set_cell(&mut self, x: u16, y: u16, c: char);

    /// Zero the whole grid and home the cursor
    fn clear_screen(&mut self);

    /// Grid size as `(width, height)`
    fn size(&self) -> (u16, u16);

    /// Erase in line: 0 = cursor to end, 1 = start up to (not including) the
    /// cursor, 2 = whole line. Other modes do nothing.
    fn erase_line(&mut self, mode: u16) {
        let (width, _) = self.size();
        let x = self.cursor_x();
        let y = self.cursor_y();
        let range = match mode {
            0 => x..width,
            1 => 0..x.min(width),
            2 => 0..width,
            _ => return,
        };
        for col in range {
            self.set_cell(col, y, ' ');
        }
    }

    /// Scroll the whole grid up by `lines`. No-op unless implemented.
    fn scroll_up(&mut self, _lines: u16) {}

    /// Scroll the whole grid down by `lines`. No-op unless implemented.
    fn scroll_down(&mut self, _lines: u16) {}
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn write(&mut self, c: char) {
        (**self).write(c);
    }

    fn set_style(&mut self, fg: u8, bg: u8) {
        (**self).set_style(fg, bg);
    }

    fn set_flags(&mut self, flags: CellFlags) {
        (**self).set_flags(flags);
    }

    fn set_cursor(&mut self, x: u16, y: u16) {
        (**self).set_cursor(x, y);
    }

    fn cursor_x(&self) -> u16 {
        (**self).cursor_x()
    }

    fn cursor_y(&self) -> u16 {
        (**self).cursor_y()
    }

    fn set_cell(&mut self, x: u16, y: u16, c: char) {
        (**self).set_cell(x, y, c);
    }

    fn clear_screen(&mut self) {
        (**self).clear_screen();
    }

    fn size(&self) -> (u16, u16) {
        (**self).size()
    }

    fn erase_line(&mut self, mode: u16) {
        (**self).erase_line(mode);
    }

    fn scroll_up(&mut self, lines: u16) {
        (**self).scroll_up(lines);
    }

    fn scroll_down(&mut self, lines: u16) {
        (**self).scroll_down(lines);
    }
}

//! Host terminal mirror
//!
//! Draws each cell onto the terminal the program itself runs in, using
//! cursor addressing and 24-bit colour escapes. Output is buffered until
//! [`Renderer::present`].

use std::fmt::Write as _;
use std::io::{self, Write};

use super::palette::Rgb;
use super::Renderer;
use crate::core::CellFlags;

/// Renders cells as ANSI escape sequences onto a writer
#[derive(Debug)]
pub struct AnsiRenderer<W: Write> {
    out: W,
    pending: String,
    /// Where the host cursor is after the last draw, 0-based
    host_cursor: Option<(u16, u16)>,
    last_error: Option<io::Error>,
}

impl<W: Write> AnsiRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            pending: String::new(),
            host_cursor: None,
            last_error: None,
        }
    }

    /// Hide the host cursor and clear the host screen
    pub fn enter(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x1b[?25l\x1b[0m\x1b[2J\x1b[H")?;
        self.out.flush()
    }

    /// Restore attributes and the host cursor
    pub fn leave(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x1b[0m\x1b[?25h\r\n")?;
        self.out.flush()
    }

    /// The error from the last failed `present`, if any
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.last_error.take()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn flush_pending(&mut self) -> io::Result<()> {
        self.out.write_all(self.pending.as_bytes())?;
        self.pending.clear();
        self.out.flush()
    }
}

impl<W: Write> Renderer for AnsiRenderer<W> {
    fn draw_cell(&mut self, x: u16, y: u16, ch: char, fg: Rgb, bg: Rgb, flags: CellFlags) {
        let out = &mut self.pending;
        if self.host_cursor != Some((x, y)) {
            let _ = write!(out, "\x1b[{};{}H", y + 1, x + 1);
        }
        let _ = write!(
            out,
            "\x1b[0;38;2;{};{};{};48;2;{};{};{}",
            fg.r, fg.g, fg.b, bg.r, bg.g, bg.b
        );
        for (flag, code) in [
            (CellFlags::BOLD, "1"),
            (CellFlags::ITALIC, "3"),
            (CellFlags::UNDERLINE, "4"),
            (CellFlags::STRIKETHROUGH, "9"),
            (CellFlags::DOUBLE_UNDERLINE, "21"),
            (CellFlags::OVERLINE, "53"),
        ] {
            if flags.contains(flag) {
                out.push(';');
                out.push_str(code);
            }
        }
        out.push('m');
        out.push(ch);

        // The host may wrap or widen; only trust plain narrow cells
        self.host_cursor = if flags.contains(CellFlags::WIDE) {
            None
        } else {
            Some((x + 1, y))
        };
    }

    fn present(&mut self) {
        if let Err(e) = self.flush_pending() {
            tracing::warn!("failed to write to host terminal: {}", e);
            self.last_error = Some(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgb = Rgb::new(255, 255, 255);
    const BLACK: Rgb = Rgb::new(0, 0, 0);

    fn output(renderer: AnsiRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_draw_is_buffered_until_present() {
        let mut renderer = AnsiRenderer::new(Vec::new());
        renderer.draw_cell(0, 0, 'a', WHITE, BLACK, CellFlags::empty());
        assert!(renderer.get_ref().is_empty());
        renderer.present();
        assert_eq!(
            output(renderer),
            "\x1b[1;1H\x1b[0;38;2;255;255;255;48;2;0;0;0ma"
        );
    }

    #[test]
    fn test_adjacent_cells_skip_cursor_addressing() {
        let mut renderer = AnsiRenderer::new(Vec::new());
        renderer.draw_cell(3, 2, 'a', WHITE, BLACK, CellFlags::empty());
        renderer.draw_cell(4, 2, 'b', WHITE, BLACK, CellFlags::empty());
        renderer.present();
        let out = output(renderer);
        assert_eq!(out.matches("H\x1b").count(), 1);
        assert!(out.starts_with("\x1b[3;4H"));
    }

    #[test]
    fn test_flags_become_sgr() {
        let mut renderer = AnsiRenderer::new(Vec::new());
        renderer.draw_cell(
            0,
            0,
            'z',
            WHITE,
            BLACK,
            CellFlags::BOLD | CellFlags::UNDERLINE | CellFlags::OVERLINE,
        );
        renderer.present();
        assert!(output(renderer).ends_with(";1;4;53mz"));
    }
}

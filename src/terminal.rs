//! Terminal
//!
//! Ties together the parser and the screen. One `Terminal` is one
//! independent emulator instance: it owns its grid, cursor and parser
//! state, and everything reaches them through it.

use crate::core::{Screen, Snapshot};
use crate::input::Echo;
use crate::parser::Parser;
use crate::renderer::{Palette, Renderer};

/// A parser bound to the screen it drives
#[derive(Debug)]
pub struct Terminal<R> {
    screen: Screen<R>,
    parser: Parser,
}

impl<R: Renderer> Terminal<R> {
    /// Create a new terminal with the given dimensions
    pub fn new(cols: u16, rows: u16, renderer: R) -> Self {
        Self::with_screen(Screen::new(cols, rows, renderer))
    }

    /// Wrap a pre-configured screen
    pub fn with_screen(screen: Screen<R>) -> Self {
        Self {
            screen,
            parser: Parser::new(),
        }
    }

    /// Build from configuration values
    pub fn configured(
        cols: u16,
        rows: u16,
        renderer: R,
        palette: Palette,
        blink_ticks: u32,
    ) -> Self {
        Self::with_screen(
            Screen::new(cols, rows, renderer)
                .with_palette(palette)
                .with_blink_ticks(blink_ticks),
        )
    }

    /// Process bytes from the child
    pub fn feed(&mut self, data: &[u8]) {
        self.parser.feed(&mut self.screen, data);
    }

    pub fn screen(&self) -> &Screen<R> {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen<R> {
        &mut self.screen
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Advance the cursor blink by one tick
    pub fn tick(&mut self) -> bool {
        self.screen.tick()
    }

    /// Flush the renderer if anything changed
    pub fn present(&mut self) -> bool {
        self.screen.present()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_screen(&self.screen)
    }

    pub fn into_renderer(self) -> R {
        self.screen.into_renderer()
    }
}

impl<R: Renderer> Echo for Terminal<R> {
    fn local_echo(&self) -> bool {
        self.parser.local_echo()
    }

    fn echo(&mut self, byte: u8) {
        self.feed(&[byte]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CellFlags, Cursor, DEFAULT_BG, DEFAULT_FG};
    use crate::renderer::{NullRenderer, RecordingRenderer};

    fn terminal(cols: u16, rows: u16) -> Terminal<NullRenderer> {
        Terminal::new(cols, rows, NullRenderer)
    }

    #[test]
    fn test_clear_then_position_then_text() {
        let mut term = terminal(80, 24);
        term.feed(b"junk\x1b[2J\x1b[10;5HHi");

        let screen = term.screen();
        assert_eq!(screen.grid().row_text(0), "");
        let h = screen.grid().cell(4, 9).unwrap();
        let i = screen.grid().cell(5, 9).unwrap();
        assert_eq!((h.ch, h.fg, h.bg), ('H', DEFAULT_FG, DEFAULT_BG));
        assert_eq!((i.ch, i.fg, i.bg), ('i', DEFAULT_FG, DEFAULT_BG));
        assert_eq!(screen.cursor(), Cursor::new(6, 9));
    }

    #[test]
    fn test_bold_red_renders_bright() {
        let mut term = Terminal::new(10, 2, RecordingRenderer::new());
        term.feed(b"\x1b[1;31mX");

        let cell = *term.screen().grid().cell(0, 0).unwrap();
        assert_eq!(cell.fg, 9);
        assert!(cell.flags.contains(CellFlags::BOLD));

        let palette = term.screen().palette().clone();
        let draw = term
            .screen()
            .renderer()
            .draws
            .iter()
            .find(|d| d.ch == 'X')
            .copied()
            .unwrap();
        assert_eq!(draw.fg, palette.get(9));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut term = terminal(10, 2);
        term.feed(b"\x1b[1;4;32;45m\x1b[0mA");
        let cell = term.screen().grid().cell(0, 0).unwrap();
        assert_eq!((cell.fg, cell.bg), (DEFAULT_FG, DEFAULT_BG));
        assert!(cell.flags.is_empty());
    }

    #[test]
    fn test_erase_line_uses_current_background() {
        let mut term = terminal(6, 2);
        term.feed(b"abcdef\x1b[1;3H\x1b[44m\x1b[K");
        let grid = term.screen().grid();
        assert_eq!(grid.row_text(0), "ab");
        assert_eq!(grid.cell(4, 0).unwrap().bg, 4);
    }

    #[test]
    fn test_echo_goes_through_parser() {
        let mut term = terminal(10, 2);
        assert!(term.local_echo());
        term.echo(b'a');
        term.echo(0x08);
        term.echo(b'b');
        assert_eq!(term.screen().grid().row_text(0), "b");

        term.feed(b"\x1b[1001z");
        assert!(!term.local_echo());
    }

    #[test]
    fn test_snapshot_reflects_grid() {
        let mut term = terminal(5, 2);
        term.feed(b"hey\nyo");
        let snapshot = term.snapshot();
        assert_eq!(snapshot.to_text(), "hey\nyo\n");
        assert_eq!((snapshot.cursor.col, snapshot.cursor.row), (2, 1));
    }
}

//! Screen model implementation
//!
//! The screen owns the grid, the cursor and the blink controller, and is
//! the one place that talks to the [`Renderer`]. Every mutation redraws
//! exactly the cells it touched; clear and scroll redraw the whole grid.
//! The cursor is shown by drawing its cell with the colours swapped.

use unicode_width::UnicodeWidthChar;

use super::cell::{Cell, CellFlags, DEFAULT_BG, DEFAULT_FG};
use super::cursor::{Blink, BlinkPhase, Cursor};
use super::grid::Grid;
use crate::parser::OutputSink;
use crate::renderer::{Palette, Renderer};

/// Tab stops every 8 columns
const TAB_WIDTH: u16 = 8;

/// Code points from here on are drawn with the "extra" (CJK) face
const EXTRA_FONT_START: u32 = 0x3000;

/// The visible terminal: grid + cursor + pen, bound to a renderer
#[derive(Debug)]
pub struct Screen<R> {
    grid: Grid,
    cursor: Cursor,
    blink: Blink,
    /// Current foreground palette index, already bold-remapped by the parser
    fg: u8,
    bg: u8,
    flags: CellFlags,
    palette: Palette,
    renderer: R,
    /// Set by any draw, cleared by `present`
    dirty: bool,
}

impl<R: Renderer> Screen<R> {
    /// Create a blank screen. Nothing is drawn until the first mutation.
    pub fn new(width: u16, height: u16, renderer: R) -> Self {
        Self {
            grid: Grid::new(width, height),
            cursor: Cursor::default(),
            blink: Blink::default(),
            fg: DEFAULT_FG,
            bg: DEFAULT_BG,
            flags: CellFlags::empty(),
            palette: Palette::default(),
            renderer,
            dirty: false,
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// Set the blink threshold in ticks
    pub fn with_blink_ticks(mut self, ticks: u32) -> Self {
        self.blink = Blink::new(ticks);
        self
    }

    pub fn width(&self) -> u16 {
        self.grid.width()
    }

    pub fn height(&self) -> u16 {
        self.grid.height()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn blink(&self) -> &Blink {
        &self.blink
    }

    /// Current pen: `(fg, bg, flags)`
    pub fn pen(&self) -> (u8, u8, CellFlags) {
        (self.fg, self.bg, self.flags)
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Whether anything was drawn since the last [`present`](Self::present)
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flush the renderer if anything was drawn. Returns whether it did.
    pub fn present(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.renderer.present();
        self.dirty = false;
        true
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    fn draw(&mut self, x: u16, y: u16, inverted: bool) {
        let Some(cell) = self.grid.cell(x, y) else {
            return;
        };
        let (ch, fg, bg, flags) = cell.visual();
        let (fg, bg) = if inverted { (bg, fg) } else { (fg, bg) };
        let fg = self.palette.get(fg);
        let bg = self.palette.get(bg);
        self.renderer.draw_cell(x, y, ch, fg, bg, flags);
        self.dirty = true;
    }

    /// Draw cell (`x`, `y`) as stored. Out-of-bounds is ignored.
    pub fn redraw_cell(&mut self, x: u16, y: u16) {
        self.draw(x, y, false);
    }

    /// Draw cell (`x`, `y`) with foreground and background swapped
    pub fn redraw_cell_inverted(&mut self, x: u16, y: u16) {
        self.draw(x, y, true);
    }

    /// Draw every cell, then the cursor
    pub fn redraw_all(&mut self) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                self.draw(x, y, false);
            }
        }
        self.draw_cursor();
    }

    /// Draw the cursor cell according to the blink phase
    fn draw_cursor(&mut self) {
        let Cursor { x, y } = self.cursor;
        let inverted = self.blink.phase() == BlinkPhase::Shown;
        self.draw(x, y, inverted);
    }

    /// Restart the blink cycle and show the cursor
    fn show_cursor(&mut self) {
        self.blink.reset();
        self.draw_cursor();
    }

    /// Advance the blink controller by one tick, redrawing the cursor cell
    /// when its phase flips. Returns whether it flipped.
    pub fn tick(&mut self) -> bool {
        if self.blink.tick() {
            self.draw_cursor();
            true
        } else {
            false
        }
    }

    // ------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------

    /// Write a character at the cursor and advance.
    ///
    /// `\n`, `\r`, `\b` and `\t` are interpreted; other C0 controls and DEL
    /// are dropped. Writing past the right edge wraps, writing past the
    /// bottom scrolls.
    pub fn write_char(&mut self, c: char) {
        let Cursor { x, y } = self.cursor;
        // Take the cursor overlay off the old cell first
        self.redraw_cell(x, y);

        match c {
            '\n' => self.line_feed(),
            '\r' => self.cursor.x = 0,
            '\x08' => self.erase_back(),
            '\t' => self.advance_tab(),
            c if (c as u32) < 0x20 || c == '\x7f' => {}
            c => self.put(c),
        }

        self.settle();
        self.show_cursor();
    }

    pub fn newline(&mut self) {
        self.write_char('\n');
    }

    pub fn carriage_return(&mut self) {
        self.write_char('\r');
    }

    pub fn backspace(&mut self) {
        self.write_char('\x08');
    }

    pub fn tab(&mut self) {
        self.write_char('\t');
    }

    fn put(&mut self, c: char) {
        let mut flags = self.flags;
        if c.width() == Some(2) {
            flags |= CellFlags::WIDE;
        }
        if c as u32 > EXTRA_FONT_START {
            flags |= CellFlags::EXTRA;
        }
        let Cursor { x, y } = self.cursor;
        self.grid.set(x, y, Cell::new(c, self.fg, self.bg, flags));
        self.redraw_cell(x, y);
        self.cursor.x = x.saturating_add(1);
    }

    fn line_feed(&mut self) {
        self.cursor.x = 0;
        self.cursor.y = self.cursor.y.saturating_add(1);
    }

    fn erase_back(&mut self) {
        if self.cursor.x == 0 {
            return;
        }
        self.cursor.x -= 1;
        let Cursor { x, y } = self.cursor;
        self.grid.set(x, y, Cell::blank(self.fg, self.bg));
        self.redraw_cell(x, y);
    }

    fn advance_tab(&mut self) {
        let next = (self.cursor.x / TAB_WIDTH + 1).saturating_mul(TAB_WIDTH);
        self.cursor.x = next;
    }

    /// Bring an overshooting cursor back into the grid: wrap, then scroll
    fn settle(&mut self) {
        if self.cursor.x >= self.width() {
            self.cursor.x = 0;
            self.cursor.y = self.cursor.y.saturating_add(1);
        }
        if self.cursor.y >= self.height() {
            self.scroll_up_one();
            self.cursor.y = self.height() - 1;
        }
    }

    /// Store `c` at (`x`, `y`) in the current colours, no flags
    pub fn set_cell(&mut self, x: u16, y: u16, c: char) {
        if self.grid.set(x, y, Cell::new(c, self.fg, self.bg, CellFlags::empty())) {
            self.redraw_cell(x, y);
        }
    }

    /// Zero every cell, home the cursor, redraw everything
    pub fn clear(&mut self) {
        self.grid.clear();
        self.cursor = Cursor::default();
        self.blink.reset();
        self.redraw_all();
    }

    /// Shift every row up by one, blank the last row, redraw everything
    pub fn scroll_up_one(&mut self) {
        self.grid.scroll_up(Cell::blank(self.fg, self.bg));
        self.redraw_all();
    }

    /// Shift every row down by one, blank the first row, redraw everything
    pub fn scroll_down_one(&mut self) {
        self.grid.scroll_down(Cell::blank(self.fg, self.bg));
        self.redraw_all();
    }

    /// Move the cursor (clamped), restoring the old cell and restarting
    /// the blink cycle on the new one
    pub fn move_cursor(&mut self, x: u16, y: u16) {
        let Cursor { x: old_x, y: old_y } = self.cursor;
        self.redraw_cell(old_x, old_y);
        self.cursor = Cursor::new(x, y).clamped(self.width(), self.height());
        self.show_cursor();
    }
}

impl<R: Renderer> OutputSink for Screen<R> {
    fn write(&mut self, c: char) {
        self.write_char(c);
    }

    fn set_style(&mut self, fg: u8, bg: u8) {
        self.fg = fg;
        self.bg = bg;
    }

    fn set_flags(&mut self, flags: CellFlags) {
        self.flags = flags;
    }

    fn set_cursor(&mut self, x: u16, y: u16) {
        self.move_cursor(x, y);
    }

    fn cursor_x(&self) -> u16 {
        self.cursor.x
    }

    fn cursor_y(&self) -> u16 {
        self.cursor.y
    }

    fn set_cell(&mut self, x: u16, y: u16, c: char) {
        Screen::set_cell(self, x, y, c);
    }

    fn clear_screen(&mut self) {
        self.clear();
    }

    fn size(&self) -> (u16, u16) {
        (self.width(), self.height())
    }

    fn scroll_up(&mut self, lines: u16) {
        for _ in 0..lines.min(self.height()) {
            self.scroll_up_one();
        }
    }

    fn scroll_down(&mut self, lines: u16) {
        for _ in 0..lines.min(self.height()) {
            self.scroll_down_one();
        }
    }
}

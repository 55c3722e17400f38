//! Rendering
//!
//! The screen calls a [`Renderer`] once per changed cell. Backends decide
//! how a cell becomes pixels (or bytes):
//!
//! - [`FramebufferRenderer`]: a pixel framebuffer, with a bitmap (PSF) or
//!   outline (fontdue, feature `gui`) glyph source
//! - [`AnsiRenderer`]: mirrors cells onto a host terminal
//! - [`NullRenderer`]: draws nothing

mod ansi;
mod bitmap;
mod framebuffer;
#[cfg(feature = "gui")]
mod outline;
mod palette;

pub use ansi::AnsiRenderer;
pub use bitmap::BitmapFont;
pub use framebuffer::{Framebuffer, FramebufferRenderer, Glyph, GlyphRaster};
#[cfg(feature = "gui")]
pub use outline::{Face, OutlineFont};
pub use palette::{Palette, Rgb};

use crate::core::CellFlags;

/// Draws single cells. Implemented outside the terminal core.
pub trait Renderer {
    /// Draw `ch` at grid position (`x`, `y`). `flags` is passed through
    /// untouched so the backend can pick faces and overlays.
    fn draw_cell(&mut self, x: u16, y: u16, ch: char, fg: Rgb, bg: Rgb, flags: CellFlags);

    /// Flush whatever the backend batched since the last call
    fn present(&mut self) {}
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn draw_cell(&mut self, x: u16, y: u16, ch: char, fg: Rgb, bg: Rgb, flags: CellFlags) {
        (**self).draw_cell(x, y, ch, fg, bg, flags);
    }

    fn present(&mut self) {
        (**self).present();
    }
}

/// A renderer that discards every draw
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw_cell(&mut self, _x: u16, _y: u16, _ch: char, _fg: Rgb, _bg: Rgb, _flags: CellFlags) {}
}

/// One recorded `draw_cell` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub x: u16,
    pub y: u16,
    pub ch: char,
    pub fg: Rgb,
    pub bg: Rgb,
    pub flags: CellFlags,
}

/// A renderer that remembers every draw, for tests and tracing tools
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pub draws: Vec<DrawCall>,
    pub presents: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent draw of cell (`x`, `y`)
    pub fn last_draw_at(&self, x: u16, y: u16) -> Option<&DrawCall> {
        self.draws.iter().rev().find(|d| d.x == x && d.y == y)
    }

    pub fn clear(&mut self) {
        self.draws.clear();
        self.presents = 0;
    }
}

impl Renderer for RecordingRenderer {
    fn draw_cell(&mut self, x: u16, y: u16, ch: char, fg: Rgb, bg: Rgb, flags: CellFlags) {
        self.draws.push(DrawCall {
            x,
            y,
            ch,
            fg,
            bg,
            flags,
        });
    }

    fn present(&mut self) {
        self.presents += 1;
    }
}

/// Error type for glyph sources
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a PSF1 font (magic {0:02x} {1:02x})")]
    BadMagic(u8, u8),

    #[error("Font data truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Failed to parse outline font: {0}")]
    Parse(String),
}

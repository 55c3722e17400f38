//! Software framebuffer rendering
//!
//! Cells are painted into a plain `0x00RRGGBB` pixel buffer. Glyph shapes
//! come from a [`GlyphRaster`] as coverage maps and are blended foreground
//! over background; line decorations are drawn from the cell flags.

use super::palette::Rgb;
use super::Renderer;
use crate::core::CellFlags;

/// A rasterized glyph, positioned relative to the top-left of its cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glyph {
    pub width: u32,
    pub height: u32,
    /// Horizontal offset from the cell's left edge
    pub left: i32,
    /// Vertical offset from the cell's top edge
    pub top: i32,
    /// Coverage, one byte per pixel, row-major (0 = background, 255 = ink)
    pub coverage: Vec<u8>,
}

/// A source of glyph shapes
pub trait GlyphRaster {
    /// Size of one cell in pixels, `(width, height)`
    fn cell_size(&self) -> (u32, u32);

    /// Shape for `ch`. `flags` selects a face where the source has one.
    /// `None` draws nothing but the background.
    fn glyph(&mut self, ch: char, flags: CellFlags) -> Option<&Glyph>;
}

impl<G: GlyphRaster + ?Sized> GlyphRaster for Box<G> {
    fn cell_size(&self) -> (u32, u32) {
        (**self).cell_size()
    }

    fn glyph(&mut self, ch: char, flags: CellFlags) -> Option<&Glyph> {
        (**self).glyph(ch, flags)
    }
}

/// A pixel buffer
#[derive(Debug, Clone)]
pub struct Framebuffer {
    pixels: Vec<u32>,
    width: u32,
    height: u32,
}

impl Framebuffer {
    /// Create a new black framebuffer
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; width as usize * height as usize],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixels, row-major, `0x00RRGGBB`
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Clear the buffer with a color
    pub fn clear(&mut self, color: Rgb) {
        self.pixels.fill(color.to_pixel());
    }

    /// Fill a rectangle with a color, clipped to the buffer
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb) {
        let pixel = color.to_pixel();
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for row in y.min(y_end)..y_end {
            let start = (row * self.width) as usize;
            self.pixels[start + x.min(x_end) as usize..start + x_end as usize].fill(pixel);
        }
    }

    /// Blend a glyph's coverage at (`x`, `y`), `fg` over `bg`, clipped to
    /// the buffer and to `clip_w` pixels from `x`
    pub fn draw_glyph(&mut self, glyph: &Glyph, x: i32, y: i32, clip_w: u32, fg: Rgb, bg: Rgb) {
        let clip_right = x as i64 + clip_w as i64;
        for gy in 0..glyph.height {
            let py = y as i64 + glyph.top as i64 + gy as i64;
            if py < 0 || py >= self.height as i64 {
                continue;
            }
            for gx in 0..glyph.width {
                let px = x as i64 + glyph.left as i64 + gx as i64;
                if px < 0 || px >= self.width as i64 || px >= clip_right {
                    continue;
                }
                let alpha = glyph
                    .coverage
                    .get((gy * glyph.width + gx) as usize)
                    .copied()
                    .unwrap_or(0);
                if alpha == 0 {
                    continue;
                }
                let idx = (py as u32 * self.width + px as u32) as usize;
                self.pixels[idx] = bg.blend(fg, alpha).to_pixel();
            }
        }
    }
}

/// Renders cells into a [`Framebuffer`] using a glyph source
#[derive(Debug)]
pub struct FramebufferRenderer<G> {
    framebuffer: Framebuffer,
    font: G,
    /// Set by `present`, cleared by `take_frame`
    frame_ready: bool,
}

impl<G: GlyphRaster> FramebufferRenderer<G> {
    /// Create a renderer sized for a `cols * rows` grid
    pub fn new(font: G, cols: u16, rows: u16) -> Self {
        let (cell_w, cell_h) = font.cell_size();
        Self {
            framebuffer: Framebuffer::new(cell_w * cols as u32, cell_h * rows as u32),
            font,
            frame_ready: false,
        }
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn font(&self) -> &G {
        &self.font
    }

    pub fn cell_size(&self) -> (u32, u32) {
        self.font.cell_size()
    }

    /// Whether a frame was presented since the last call
    pub fn take_frame(&mut self) -> bool {
        std::mem::take(&mut self.frame_ready)
    }
}

impl<G: GlyphRaster> Renderer for FramebufferRenderer<G> {
    fn draw_cell(&mut self, x: u16, y: u16, ch: char, fg: Rgb, bg: Rgb, flags: CellFlags) {
        let (cell_w, cell_h) = self.font.cell_size();
        let span = if flags.contains(CellFlags::WIDE) { 2 } else { 1 };
        let width = cell_w * span;
        let px = x as u32 * cell_w;
        let py = y as u32 * cell_h;

        self.framebuffer.fill_rect(px, py, width, cell_h, bg);

        if ch != ' ' {
            if let Some(glyph) = self.font.glyph(ch, flags) {
                self.framebuffer
                    .draw_glyph(glyph, px as i32, py as i32, width, fg, bg);
            }
        }

        // Decorations
        let mut line = |row: u32| {
            if row < cell_h {
                self.framebuffer.fill_rect(px, py + row, width, 1, fg);
            }
        };
        if flags.contains(CellFlags::OVERLINE) {
            line(0);
        }
        if flags.contains(CellFlags::STRIKETHROUGH) {
            line(cell_h / 2);
        }
        if flags.contains(CellFlags::DOUBLE_UNDERLINE) {
            line(cell_h.saturating_sub(1));
            line(cell_h.saturating_sub(3));
        } else if flags.contains(CellFlags::UNDERLINE) {
            line(cell_h.saturating_sub(2));
        }
    }

    fn present(&mut self) {
        self.frame_ready = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x6 cells; every glyph is a solid 2x2 block at (1, 1)
    struct BlockFont {
        glyph: Glyph,
    }

    impl BlockFont {
        fn new() -> Self {
            Self {
                glyph: Glyph {
                    width: 2,
                    height: 2,
                    left: 1,
                    top: 1,
                    coverage: vec![255; 4],
                },
            }
        }
    }

    impl GlyphRaster for BlockFont {
        fn cell_size(&self) -> (u32, u32) {
            (4, 6)
        }

        fn glyph(&mut self, _ch: char, _flags: CellFlags) -> Option<&Glyph> {
            Some(&self.glyph)
        }
    }

    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    #[test]
    fn test_framebuffer_fill_rect_clips() {
        let mut fb = Framebuffer::new(10, 10);
        fb.fill_rect(8, 8, 5, 5, RED);
        assert_eq!(fb.pixel(9, 9), Some(0xff0000));
        assert_eq!(fb.pixel(7, 7), Some(0));
        assert_eq!(fb.pixel(10, 0), None);
    }

    #[test]
    fn test_draw_cell_paints_background_and_glyph() {
        let mut renderer = FramebufferRenderer::new(BlockFont::new(), 3, 2);
        assert_eq!(renderer.framebuffer().width(), 12);
        assert_eq!(renderer.framebuffer().height(), 12);

        renderer.draw_cell(1, 1, 'x', RED, BLUE, CellFlags::empty());
        let fb = renderer.framebuffer();
        // Cell (1,1) starts at pixel (4,6)
        assert_eq!(fb.pixel(4, 6), Some(0x0000ff));
        assert_eq!(fb.pixel(5, 7), Some(0xff0000));
        assert_eq!(fb.pixel(6, 8), Some(0xff0000));
        assert_eq!(fb.pixel(7, 11), Some(0x0000ff));
        // Neighbouring cell untouched
        assert_eq!(fb.pixel(3, 6), Some(0));
    }

    #[test]
    fn test_space_draws_background_only() {
        let mut renderer = FramebufferRenderer::new(BlockFont::new(), 1, 1);
        renderer.draw_cell(0, 0, ' ', RED, BLUE, CellFlags::empty());
        assert!(renderer.framebuffer().pixels().iter().all(|&p| p == 0x0000ff));
    }

    #[test]
    fn test_decorations() {
        let mut renderer = FramebufferRenderer::new(BlockFont::new(), 1, 1);
        renderer.draw_cell(
            0,
            0,
            ' ',
            RED,
            BLUE,
            CellFlags::UNDERLINE | CellFlags::OVERLINE | CellFlags::STRIKETHROUGH,
        );
        let fb = renderer.framebuffer();
        assert_eq!(fb.pixel(0, 0), Some(0xff0000));
        assert_eq!(fb.pixel(3, 3), Some(0xff0000));
        assert_eq!(fb.pixel(2, 4), Some(0xff0000));
        assert_eq!(fb.pixel(2, 5), Some(0x0000ff));
    }

    #[test]
    fn test_wide_cell_spans_two_columns() {
        let mut renderer = FramebufferRenderer::new(BlockFont::new(), 2, 1);
        renderer.draw_cell(0, 0, ' ', RED, BLUE, CellFlags::WIDE);
        assert_eq!(renderer.framebuffer().pixel(7, 5), Some(0x0000ff));
    }

    #[test]
    fn test_present_marks_frame() {
        let mut renderer = FramebufferRenderer::new(BlockFont::new(), 1, 1);
        assert!(!renderer.take_frame());
        renderer.present();
        assert!(renderer.take_frame());
        assert!(!renderer.take_frame());
    }
}

//! Outline font rendering
//!
//! Antialiased glyphs from TrueType/OpenType fonts via fontdue. Separate
//! bold, italic and "extra" (CJK) faces are optional; missing faces fall
//! back to the regular one.

use std::collections::HashMap;
use std::path::Path;

use fontdue::{Font, FontSettings};

use super::framebuffer::{Glyph, GlyphRaster};
use super::FontError;
use crate::core::CellFlags;

/// Which face a glyph comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Regular,
    Bold,
    Italic,
    Extra,
}

impl Face {
    fn for_flags(flags: CellFlags) -> Self {
        if flags.contains(CellFlags::EXTRA) {
            Face::Extra
        } else if flags.contains(CellFlags::BOLD) {
            Face::Bold
        } else if flags.contains(CellFlags::ITALIC) {
            Face::Italic
        } else {
            Face::Regular
        }
    }
}

/// Monospace font rendered with fontdue
pub struct OutlineFont {
    faces: HashMap<Face, Font>,
    size: f32,
    cell_width: u32,
    cell_height: u32,
    /// Baseline offset from top of cell
    baseline: f32,
    cache: HashMap<(char, Face), Glyph>,
}

impl std::fmt::Debug for OutlineFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineFont")
            .field("size", &self.size)
            .field("cell_width", &self.cell_width)
            .field("cell_height", &self.cell_height)
            .finish()
    }
}

fn parse(data: &[u8], size: f32) -> Result<Font, FontError> {
    let settings = FontSettings {
        scale: size,
        ..FontSettings::default()
    };
    Font::from_bytes(data, settings).map_err(|e| FontError::Parse(e.to_string()))
}

impl OutlineFont {
    /// Create a font with the given font file and pixel size
    pub fn load(path: &Path, size: f32) -> Result<Self, FontError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data, size)
    }

    /// Create a font from font data bytes. Cell size comes from the
    /// advance of 'M' and the line metrics.
    pub fn from_bytes(data: &[u8], size: f32) -> Result<Self, FontError> {
        let font = parse(data, size)?;

        let (metrics, _) = font.rasterize('M', size);
        let line_metrics = font
            .horizontal_line_metrics(size)
            .ok_or_else(|| FontError::Parse("No line metrics".to_string()))?;

        let mut faces = HashMap::new();
        faces.insert(Face::Regular, font);

        Ok(Self {
            faces,
            size,
            cell_width: metrics.advance_width.ceil().max(1.0) as u32,
            cell_height: line_metrics.new_line_size.ceil().max(1.0) as u32,
            baseline: line_metrics.ascent,
            cache: HashMap::new(),
        })
    }

    /// Try common system monospace fonts in order
    pub fn with_default_font(size: f32) -> Result<Self, FontError> {
        const FONT_PATHS: [&str; 5] = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
            "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
            "/usr/share/fonts/truetype/ubuntu/UbuntuMono-R.ttf",
            "/usr/share/fonts/truetype/freefont/FreeMono.ttf",
        ];

        for path in FONT_PATHS {
            if let Ok(font) = Self::load(Path::new(path), size) {
                tracing::info!("Loaded font: {}", path);
                return Ok(font);
            }
        }

        Err(FontError::Parse("no usable system monospace font".to_string()))
    }

    /// Add a bold, italic or extra face from a file
    pub fn load_face(&mut self, face: Face, path: &Path) -> Result<(), FontError> {
        let data = std::fs::read(path)?;
        self.faces.insert(face, parse(&data, self.size)?);
        self.cache.retain(|(_, f), _| *f != face);
        Ok(())
    }

    pub fn size(&self) -> f32 {
        self.size
    }
}

impl GlyphRaster for OutlineFont {
    fn cell_size(&self) -> (u32, u32) {
        (self.cell_width, self.cell_height)
    }

    fn glyph(&mut self, ch: char, flags: CellFlags) -> Option<&Glyph> {
        let wanted = Face::for_flags(flags);
        let face = if self.faces.contains_key(&wanted) {
            wanted
        } else {
            Face::Regular
        };
        let key = (ch, face);

        if !self.cache.contains_key(&key) {
            let font = self.faces.get(&face)?;
            let (metrics, coverage) = font.rasterize(ch, self.size);
            let top = self.baseline - (metrics.ymin as f32 + metrics.height as f32);
            self.cache.insert(
                key,
                Glyph {
                    width: metrics.width as u32,
                    height: metrics.height as u32,
                    left: metrics.xmin,
                    top: top.round() as i32,
                    coverage,
                },
            );
        }
        self.cache.get(&key)
    }
}

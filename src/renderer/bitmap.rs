//! PSF1 bitmap fonts
//!
//! Console fonts: monochrome, 8 pixels wide, one byte per glyph row. The
//! optional unicode table maps code points to glyph indices; without it a
//! code point indexes the glyph table directly. Code points the font does
//! not cover render blank.

use std::collections::HashMap;
use std::path::Path;

use super::framebuffer::{Glyph, GlyphRaster};
use super::FontError;
use crate::core::CellFlags;

const PSF1_MAGIC: [u8; 2] = [0x36, 0x04];
const PSF1_MODE_512: u8 = 0x01;
const PSF1_MODE_HAS_TABLE: u8 = 0x02;
const PSF1_SEPARATOR: u16 = 0xFFFF;
const PSF1_START_SEQ: u16 = 0xFFFE;
const HEADER_LEN: usize = 4;
const GLYPH_WIDTH: u32 = 8;

/// A PSF1 console font
#[derive(Debug, Clone)]
pub struct BitmapFont {
    /// Glyph rows, `height` bytes per glyph
    bitmaps: Vec<u8>,
    height: u32,
    count: usize,
    unicode: Option<HashMap<char, usize>>,
    cache: HashMap<(char, bool), Glyph>,
}

impl BitmapFont {
    /// Load a PSF1 font from disk
    pub fn load(path: &Path) -> Result<Self, FontError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Parse a PSF1 font
    pub fn from_bytes(data: &[u8]) -> Result<Self, FontError> {
        if data.len() < HEADER_LEN {
            return Err(FontError::Truncated {
                expected: HEADER_LEN,
                actual: data.len(),
            });
        }
        if data[..2] != PSF1_MAGIC {
            return Err(FontError::BadMagic(data[0], data[1]));
        }

        let mode = data[2];
        let height = data[3] as usize;
        let count = if mode & PSF1_MODE_512 != 0 { 512 } else { 256 };
        let glyphs_end = HEADER_LEN + count * height;
        if data.len() < glyphs_end {
            return Err(FontError::Truncated {
                expected: glyphs_end,
                actual: data.len(),
            });
        }

        let unicode = if mode & PSF1_MODE_HAS_TABLE != 0 {
            Some(parse_unicode_table(&data[glyphs_end..], count))
        } else {
            None
        };

        Ok(Self {
            bitmaps: data[HEADER_LEN..glyphs_end].to_vec(),
            height: height as u32,
            count,
            unicode,
            cache: HashMap::new(),
        })
    }

    /// Number of glyphs in the font
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn index_of(&self, ch: char) -> Option<usize> {
        match &self.unicode {
            Some(table) => table.get(&ch).copied(),
            None => Some(ch as usize).filter(|&i| i < self.count),
        }
    }

    fn rasterize(&self, index: usize, bold: bool) -> Glyph {
        let height = self.height as usize;
        let rows = &self.bitmaps[index * height..(index + 1) * height];
        let mut coverage = Vec::with_capacity(rows.len() * GLYPH_WIDTH as usize);
        for &row in rows {
            // Bold smears each row one pixel to the right
            let row = if bold { row | (row >> 1) } else { row };
            for bit in 0..GLYPH_WIDTH {
                let on = row & (0x80 >> bit) != 0;
                coverage.push(if on { 255 } else { 0 });
            }
        }
        Glyph {
            width: GLYPH_WIDTH,
            height: self.height,
            left: 0,
            top: 0,
            coverage,
        }
    }
}

impl GlyphRaster for BitmapFont {
    fn cell_size(&self) -> (u32, u32) {
        (GLYPH_WIDTH, self.height)
    }

    fn glyph(&mut self, ch: char, flags: CellFlags) -> Option<&Glyph> {
        let bold = flags.contains(CellFlags::BOLD);
        let key = (ch, bold);
        if !self.cache.contains_key(&key) {
            let index = self.index_of(ch)?;
            let glyph = self.rasterize(index, bold);
            self.cache.insert(key, glyph);
        }
        self.cache.get(&key)
    }
}

/// Read the PSF1 unicode table: per glyph, UCS-2 entries up to a
/// separator. Multi-code-point sequences are skipped.
fn parse_unicode_table(data: &[u8], count: usize) -> HashMap<char, usize> {
    let mut table = HashMap::new();
    let mut glyph = 0;
    let mut in_sequence = false;

    for pair in data.chunks_exact(2) {
        if glyph >= count {
            break;
        }
        match u16::from_le_bytes([pair[0], pair[1]]) {
            PSF1_SEPARATOR => {
                glyph += 1;
                in_sequence = false;
            }
            PSF1_START_SEQ => in_sequence = true,
            _ if in_sequence => {}
            unit => {
                if let Some(ch) = char::from_u32(unit as u32) {
                    table.entry(ch).or_insert(glyph);
                }
            }
        }
    }

    table
}

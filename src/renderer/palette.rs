//! The 256-entry colour palette
//!
//! Cells store palette indices; the screen resolves them to RGB here
//! before handing them to a renderer.

use serde::{Deserialize, Serialize};

/// A 24-bit colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// From a `0xRRGGBB` literal
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    /// As a `0x00RRGGBB` framebuffer pixel
    pub const fn to_pixel(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Blend `top` over `self` with coverage `alpha` (0 = self, 255 = top)
    pub fn blend(self, top: Rgb, alpha: u8) -> Rgb {
        let a = alpha as u32;
        let mix = |bottom: u8, top: u8| ((bottom as u32 * (255 - a) + top as u32 * a) / 255) as u8;
        Rgb::new(mix(self.r, top.r), mix(self.g, top.g), mix(self.b, top.b))
    }
}

/// The 16 ANSI colours: a Tango-like scheme
const ANSI_DEFAULTS: [u32; 16] = [
    0x2e3436, // black
    0xcc0000, // red
    0x3e9a06, // green
    0xc4a000, // brown
    0x3465a4, // navy
    0x75507b, // purple
    0x06989a, // dark cyan
    0xeeeeec, // grey
    0x555753, // dark grey
    0xef2929, // red
    0x8ae234, // green
    0xfce94f, // yellow
    0x729fcf, // blue
    0xad7fa8, // magenta
    0x34e2e2, // cyan
    0xffffff, // white
];

/// Palette mapping indices 0-255 to RGB
///
/// Only the 16 ANSI colours are configurable; 16-231 is the xterm colour
/// cube and 232-255 the grey ramp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub ansi: [Rgb; 16],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            ansi: ANSI_DEFAULTS.map(Rgb::from_hex),
        }
    }
}

impl Palette {
    /// Resolve a palette index
    pub fn get(&self, index: u8) -> Rgb {
        match index {
            0..=15 => self.ansi[index as usize],
            16..=231 => {
                let n = index - 16;
                let to_component = |c: u8| if c == 0 { 0 } else { 55 + c * 40 };
                Rgb::new(
                    to_component(n / 36),
                    to_component((n / 6) % 6),
                    to_component(n % 6),
                )
            }
            232..=255 => {
                let gray = 8 + (index - 232) * 10;
                Rgb::new(gray, gray, gray)
            }
        }
    }
}

//! Terminal Cell
//!
//! Represents a single position in the terminal grid: a code point, two
//! palette indices, and a set of style flags.

use serde::{Deserialize, Serialize};

/// Default foreground palette index (light grey)
pub const DEFAULT_FG: u8 = 0x07;

/// Default background palette index (black)
pub const DEFAULT_BG: u8 = 0x10;

bitflags::bitflags! {
    /// Style attributes stored alongside each cell.
    ///
    /// The renderer receives these unmodified and decides which overlays
    /// (underline, strikethrough, ...) and which font face to use.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CellFlags: u8 {
        const BOLD = 0x01;
        const UNDERLINE = 0x02;
        const ITALIC = 0x04;
        /// Character should use the "extra" font (CJK)
        const EXTRA = 0x08;
        const DOUBLE_UNDERLINE = 0x10;
        const OVERLINE = 0x20;
        /// Character is double width
        const WIDE = 0x40;
        const STRIKETHROUGH = 0x80;
    }
}

/// A single cell in the terminal grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cell {
    /// The character, `'\0'` for an empty cell
    pub ch: char,
    /// Foreground palette index
    pub fg: u8,
    /// Background palette index
    pub bg: u8,
    /// Style flags
    pub flags: CellFlags,
}

impl Cell {
    /// The all-zero cell produced by a full clear
    pub const EMPTY: Cell = Cell {
        ch: '\0',
        fg: 0,
        bg: 0,
        flags: CellFlags::empty(),
    };

    pub fn new(ch: char, fg: u8, bg: u8, flags: CellFlags) -> Self {
        Self { ch, fg, bg, flags }
    }

    /// A space in the given colours, used for erased and scrolled-in cells
    pub fn blank(fg: u8, bg: u8) -> Self {
        Self::new(' ', fg, bg, CellFlags::empty())
    }

    /// Empty cells render as a default-coloured space whatever else they store
    pub fn is_empty(&self) -> bool {
        self.ch == '\0'
    }

    /// The `(ch, fg, bg, flags)` actually shown for this cell
    pub fn visual(&self) -> (char, u8, u8, CellFlags) {
        if self.is_empty() {
            (' ', DEFAULT_FG, DEFAULT_BG, CellFlags::empty())
        } else {
            (self.ch, self.fg, self.bg, self.flags)
        }
    }
}

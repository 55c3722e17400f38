//! Select Graphic Rendition
//!
//! The pen holds the colours and flags set by `ESC [ ... m`. Parameters
//! apply in order; later values override earlier ones.

use serde::{Deserialize, Serialize};

use super::params::Params;
use crate::core::{CellFlags, DEFAULT_BG, DEFAULT_FG};

/// Current drawing attributes as set by SGR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pen {
    pub fg: u8,
    pub bg: u8,
    pub flags: CellFlags,
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            fg: DEFAULT_FG,
            bg: DEFAULT_BG,
            flags: CellFlags::empty(),
        }
    }
}

impl Pen {
    /// Reset colours and flags to the defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Foreground as rendered: bold maps the low colours (0-8) onto the
    /// bright range 8-15
    pub fn effective_fg(&self) -> u8 {
        if self.flags.contains(CellFlags::BOLD) && self.fg < 9 {
            self.fg % 8 + 8
        } else {
            self.fg
        }
    }

    /// Apply one SGR parameter list.
    ///
    /// `38;5;N` / `48;5;N` are recognised at the `5`: the field before it
    /// selects the layer and the field after it is consumed as the index.
    /// A `5` with no such context is ignored.
    pub fn apply(&mut self, params: &Params<'_>) {
        let mut values: Vec<i32> = params.values().collect();
        if values.is_empty() {
            // `ESC [ m` is `ESC [ 0 m`
            values.push(0);
        }

        let mut i = 0;
        while i < values.len() {
            let value = values[i];
            match value {
                0 => self.reset(),
                1 => self.flags |= CellFlags::BOLD,
                3 => self.flags |= CellFlags::ITALIC,
                4 => self.flags |= CellFlags::UNDERLINE,
                5 => {
                    let layer = i.checked_sub(1).map(|j| values[j]);
                    let index = values.get(i + 1).copied();
                    match (layer, index) {
                        (Some(38), Some(n)) => {
                            self.fg = n.clamp(0, 255) as u8;
                            i += 1;
                        }
                        (Some(48), Some(n)) => {
                            self.bg = n.clamp(0, 255) as u8;
                            i += 1;
                        }
                        _ => {}
                    }
                }
                7 => std::mem::swap(&mut self.fg, &mut self.bg),
                9 => self.flags |= CellFlags::STRIKETHROUGH,
                30..=38 => self.fg = (value - 30) as u8,
                39 => self.fg = DEFAULT_FG,
                40..=48 => self.bg = (value - 40) as u8,
                49 => self.bg = DEFAULT_BG,
                90..=97 => self.fg = (value - 90 + 8) as u8,
                100..=107 => self.bg = (value - 100 + 8) as u8,
                _ => tracing::trace!(code = value, "ignoring SGR parameter"),
            }
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pen_after(raw: &str) -> Pen {
        let mut pen = Pen::default();
        pen.apply(&Params::parse(raw.as_bytes()));
        pen
    }

    #[test]
    fn test_basic_colors() {
        let pen = pen_after("31;42");
        assert_eq!((pen.fg, pen.bg), (1, 2));
        let pen = pen_after("93;104");
        assert_eq!((pen.fg, pen.bg), (11, 12));
    }

    #[test]
    fn test_bold_remaps_effective_fg() {
        let pen = pen_after("1;31");
        assert!(pen.flags.contains(CellFlags::BOLD));
        assert_eq!(pen.fg, 1);
        assert_eq!(pen.effective_fg(), 9);

        // Default fg 7 goes bright too
        assert_eq!(pen_after("1").effective_fg(), 15);
        // 8 maps onto itself, indices above 8 are untouched
        assert_eq!(pen_after("1;38;5;8").effective_fg(), 8);
        assert_eq!(pen_after("1;38;5;200").effective_fg(), 200);
    }

    #[test]
    fn test_reset() {
        let pen = pen_after("1;4;31;44;0");
        assert_eq!(pen, Pen::default());
    }

    #[test]
    fn test_later_values_override() {
        let pen = pen_after("31;32;0;33");
        assert_eq!(pen.fg, 3);
        assert_eq!(pen.bg, DEFAULT_BG);
    }

    #[test]
    fn test_default_colors() {
        let pen = pen_after("31;41;39;49");
        assert_eq!((pen.fg, pen.bg), (DEFAULT_FG, DEFAULT_BG));
    }

    #[test]
    fn test_flags() {
        let pen = pen_after("3;4;9");
        assert_eq!(
            pen.flags,
            CellFlags::ITALIC | CellFlags::UNDERLINE | CellFlags::STRIKETHROUGH
        );
    }

    #[test]
    fn test_inverse_swaps() {
        let pen = pen_after("31;42;7");
        assert_eq!((pen.fg, pen.bg), (2, 1));
    }

    #[test]
    fn test_extended_colors() {
        let pen = pen_after("38;5;196;48;5;21");
        assert_eq!((pen.fg, pen.bg), (196, 21));
    }

    #[test]
    fn test_bare_38_48_select_color_8() {
        let pen = pen_after("38");
        assert_eq!((pen.fg, pen.bg), (8, DEFAULT_BG));
        let pen = pen_after("48");
        assert_eq!((pen.fg, pen.bg), (DEFAULT_FG, 8));
    }

    #[test]
    fn test_extended_index_is_consumed() {
        // The 1 after `38;5` is the index, not bold
        let pen = pen_after("38;5;1");
        assert_eq!(pen.fg, 1);
        assert!(pen.flags.is_empty());
    }

    #[test]
    fn test_stray_five_is_ignored() {
        assert_eq!(pen_after("5"), Pen::default());
        assert_eq!(pen_after("31;5;2").fg, 1);
        // 38;5 with nothing after it keeps what the bare 38 set
        assert_eq!(pen_after("38;5").fg, 8);
    }

    #[test]
    fn test_empty_list_resets() {
        let mut pen = pen_after("1;31");
        pen.apply(&Params::parse(b""));
        assert_eq!(pen, Pen::default());
    }
}

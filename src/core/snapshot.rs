//! Deterministic snapshot generation
//!
//! Snapshots capture the grid, cursor and pen in a serializable form for
//! headless runs and tests. Given the same byte stream, the terminal
//! produces identical snapshots.

use serde::{Deserialize, Serialize};

use super::cell::{Cell, CellFlags};
use super::screen::Screen;
use crate::renderer::Renderer;

/// A complete snapshot of the screen state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub cols: u16,
    pub rows: u16,
    /// Visible grid content (row-major)
    pub grid: Vec<Vec<CellSnapshot>>,
    pub cursor: CursorSnapshot,
    /// Pen colours and flags for the next write
    pub fg: u8,
    pub bg: u8,
    #[serde(default, skip_serializing_if = "CellFlags::is_empty")]
    pub flags: CellFlags,
}

/// Snapshot of a single cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSnapshot {
    /// Character content, empty for an empty cell
    pub content: String,
    pub fg: u8,
    pub bg: u8,
    #[serde(default, skip_serializing_if = "CellFlags::is_empty")]
    pub flags: CellFlags,
}

/// Snapshot of cursor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorSnapshot {
    pub col: u16,
    pub row: u16,
}

impl From<&Cell> for CellSnapshot {
    fn from(cell: &Cell) -> Self {
        CellSnapshot {
            content: if cell.is_empty() {
                String::new()
            } else {
                cell.ch.to_string()
            },
            fg: cell.fg,
            bg: cell.bg,
            flags: cell.flags,
        }
    }
}

impl Snapshot {
    /// Create a snapshot from the current screen state
    pub fn from_screen<R: Renderer>(screen: &Screen<R>) -> Self {
        let grid = screen.grid();
        let rows = (0..grid.height())
            .map(|y| {
                grid.row(y)
                    .map(|cells| cells.iter().map(CellSnapshot::from).collect())
                    .unwrap_or_default()
            })
            .collect();
        let cursor = screen.cursor();
        let (fg, bg, flags) = screen.pen();

        Snapshot {
            cols: grid.width(),
            rows: grid.height(),
            grid: rows,
            cursor: CursorSnapshot {
                col: cursor.x,
                row: cursor.y,
            },
            fg,
            bg,
            flags,
        }
    }

    /// Convert snapshot to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse snapshot from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Plain text of the grid, trailing spaces and blank lines trimmed
    pub fn to_text(&self) -> String {
        let mut result = String::new();

        for row in &self.grid {
            for cell in row {
                if cell.content.is_empty() {
                    result.push(' ');
                } else {
                    result.push_str(&cell.content);
                }
            }
            while result.ends_with(' ') {
                result.pop();
            }
            result.push('\n');
        }

        while result.ends_with("\n\n") {
            result.pop();
        }

        result
    }

    /// Whether two snapshots show the same cells
    pub fn content_equals(&self, other: &Snapshot) -> bool {
        self.cols == other.cols && self.rows == other.rows && self.grid == other.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::OutputSink;
    use crate::renderer::NullRenderer;

    #[test]
    fn test_snapshot_from_screen() {
        let mut screen = Screen::new(10, 3, NullRenderer);
        screen.write_char('H');
        screen.write_char('i');

        let snapshot = Snapshot::from_screen(&screen);

        assert_eq!(snapshot.cols, 10);
        assert_eq!(snapshot.rows, 3);
        assert_eq!(snapshot.grid[0][0].content, "H");
        assert_eq!(snapshot.grid[0][1].content, "i");
        assert_eq!(snapshot.grid[0][2].content, "");
        assert_eq!(snapshot.cursor, CursorSnapshot { col: 2, row: 0 });
    }

    #[test]
    fn test_snapshot_to_text() {
        let mut screen = Screen::new(10, 3, NullRenderer);
        for c in "AB\nC".chars() {
            screen.write_char(c);
        }

        let text = Snapshot::from_screen(&screen).to_text();
        assert_eq!(text, "AB\nC\n");
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let mut screen = Screen::new(5, 2, NullRenderer);
        screen.write_char('X');
        screen.set_style(9, 4);
        screen.set_flags(CellFlags::BOLD | CellFlags::UNDERLINE);
        screen.write_char('Y');

        let snapshot = Snapshot::from_screen(&screen);
        let json = snapshot.to_json().unwrap();
        let restored = Snapshot::from_json(&json).unwrap();

        assert_eq!(snapshot, restored);
        assert_eq!(restored.grid[0][1].flags, CellFlags::BOLD | CellFlags::UNDERLINE);
    }
}

//! Terminal Grid
//!
//! A fixed-size, row-major 2D array of cells. The grid owns no I/O and
//! knows nothing about rendering; the screen decides what to redraw.

use serde::{Deserialize, Serialize};

use super::cell::Cell;

/// The terminal grid - `width * height` cells, row-major
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cells: Vec<Cell>,
    width: u16,
    height: u16,
}

impl Grid {
    /// Create an all-empty grid. Both dimensions are forced to at least 1.
    pub fn new(width: u16, height: u16) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            cells: vec![Cell::EMPTY; width as usize * height as usize],
            width,
            height,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Get a cell, `None` when out of bounds
    pub fn cell(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    /// Store a cell. Out-of-bounds writes are ignored and return false.
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    /// A whole row as a slice
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.width as usize;
        Some(&self.cells[start..start + self.width as usize])
    }

    /// Overwrite `x_start..x_end` on row `y` (clipped to the row)
    pub fn fill_row(&mut self, y: u16, x_start: u16, x_end: u16, cell: Cell) {
        if y >= self.height {
            return;
        }
        let x_end = x_end.min(self.width);
        for x in x_start..x_end {
            if let Some(i) = self.index(x, y) {
                self.cells[i] = cell;
            }
        }
    }

    /// Zero every cell
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    /// Shift every row up by one; the last row becomes `blank`
    pub fn scroll_up(&mut self, blank: Cell) {
        let w = self.width as usize;
        self.cells.copy_within(w.., 0);
        let len = self.cells.len();
        self.cells[len - w..].fill(blank);
    }

    /// Shift every row down by one; the first row becomes `blank`
    pub fn scroll_down(&mut self, blank: Cell) {
        let w = self.width as usize;
        let len = self.cells.len();
        self.cells.copy_within(..len - w, w);
        self.cells[..w].fill(blank);
    }

    /// Text of a row, empty cells as spaces, trailing spaces trimmed
    pub fn row_text(&self, y: u16) -> String {
        self.row(y)
            .map(|cells| {
                let text: String = cells
                    .iter()
                    .map(|c| if c.is_empty() { ' ' } else { c.ch })
                    .collect();
                text.trim_end().to_string()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cell::CellFlags;

    fn put(grid: &mut Grid, x: u16, y: u16, ch: char) {
        grid.set(x, y, Cell::new(ch, 7, 16, CellFlags::empty()));
    }

    #[test]
    fn test_grid_new() {
        let grid = Grid::new(80, 24);
        assert_eq!(grid.width(), 80);
        assert_eq!(grid.height(), 24);
        assert!(grid.cell(79, 23).unwrap().is_empty());
        assert!(grid.cell(80, 0).is_none());
    }

    #[test]
    fn test_grid_zero_size_is_clamped() {
        let grid = Grid::new(0, 0);
        assert_eq!(grid.width(), 1);
        assert_eq!(grid.height(), 1);
    }

    #[test]
    fn test_out_of_bounds_set_is_ignored() {
        let mut grid = Grid::new(4, 2);
        assert!(!grid.set(4, 0, Cell::blank(1, 2)));
        assert!(!grid.set(0, 2, Cell::blank(1, 2)));
        assert!(grid.row(0).unwrap().iter().all(Cell::is_empty));
    }

    #[test]
    fn test_scroll_up_evicts_first_row() {
        let mut grid = Grid::new(3, 3);
        put(&mut grid, 0, 0, 'a');
        put(&mut grid, 0, 1, 'b');
        put(&mut grid, 0, 2, 'c');

        grid.scroll_up(Cell::blank(7, 16));

        assert_eq!(grid.row_text(0), "b");
        assert_eq!(grid.row_text(1), "c");
        assert_eq!(grid.row_text(2), "");
        assert_eq!(grid.cell(0, 2).unwrap().ch, ' ');
    }

    #[test]
    fn test_scroll_down_evicts_last_row() {
        let mut grid = Grid::new(3, 3);
        put(&mut grid, 1, 0, 'a');
        put(&mut grid, 1, 2, 'c');

        grid.scroll_down(Cell::blank(7, 16));

        assert_eq!(grid.row_text(0), "");
        assert_eq!(grid.row_text(1), " a");
        assert_eq!(grid.row_text(2), "");
    }

    #[test]
    fn test_fill_row_clips() {
        let mut grid = Grid::new(5, 1);
        grid.fill_row(0, 3, 100, Cell::new('x', 1, 2, CellFlags::empty()));
        assert_eq!(grid.row_text(0), "   xx");
    }

    #[test]
    fn test_clear_zeroes_everything() {
        let mut grid = Grid::new(2, 2);
        put(&mut grid, 1, 1, 'z');
        grid.clear();
        assert!(grid.cell(1, 1).unwrap().is_empty());
    }
}

//! Terminal Core Module
//!
//! Platform-independent terminal state. This module contains:
//! - Cell representation with palette colours and style flags
//! - The fixed-size grid
//! - Cursor state and the blink controller
//! - The screen, which owns all of the above and drives a renderer
//! - Deterministic snapshot generation

mod cell;
mod cursor;
mod grid;
mod screen;
mod snapshot;

pub use cell::{Cell, CellFlags, DEFAULT_BG, DEFAULT_FG};
pub use cursor::{Blink, BlinkPhase, Cursor, DEFAULT_BLINK_TICKS};
pub use grid::Grid;
pub use screen::Screen;
pub use snapshot::{CellSnapshot, CursorSnapshot, Snapshot};

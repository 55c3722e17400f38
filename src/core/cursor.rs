//! Cursor state and the blink controller
//!
//! The cursor is shown by drawing the cell under it with foreground and
//! background swapped. Blinking alternates that inverted rendering with
//! the normal one, driven by a tick counter the event loop advances once
//! per iteration.

use serde::{Deserialize, Serialize};

/// Default blink threshold in loop iterations
pub const DEFAULT_BLINK_TICKS: u32 = 50;

/// Cursor position, 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cursor {
    pub x: u16,
    pub y: u16,
}

impl Cursor {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Clamp into a `width * height` grid
    pub fn clamped(self, width: u16, height: u16) -> Self {
        Self {
            x: self.x.min(width.saturating_sub(1)),
            y: self.y.min(height.saturating_sub(1)),
        }
    }
}

/// Visual state of the cell under the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlinkPhase {
    /// Cell drawn inverted; the state right after the cursor moves
    Shown,
    /// Cell drawn normally
    Hidden,
}

/// Tick-driven blink controller
#[derive(Debug, Clone)]
pub struct Blink {
    ticks: u32,
    threshold: u32,
    phase: BlinkPhase,
}

impl Default for Blink {
    fn default() -> Self {
        Self::new(DEFAULT_BLINK_TICKS)
    }
}

impl Blink {
    /// A threshold of 0 is treated as 1 (toggle every tick)
    pub fn new(threshold: u32) -> Self {
        Self {
            ticks: 0,
            threshold: threshold.max(1),
            phase: BlinkPhase::Shown,
        }
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Advance one tick. Returns true when the phase toggled.
    pub fn tick(&mut self) -> bool {
        self.ticks += 1;
        if self.ticks < self.threshold {
            return false;
        }
        self.ticks = 0;
        self.phase = match self.phase {
            BlinkPhase::Shown => BlinkPhase::Hidden,
            BlinkPhase::Hidden => BlinkPhase::Shown,
        };
        true
    }

    /// Restart the cycle after the cursor was placed
    pub fn reset(&mut self) {
        self.ticks = 0;
        self.phase = BlinkPhase::Shown;
    }
}

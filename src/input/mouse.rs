//! Mouse pointer tracking
//!
//! The mouse device delivers fixed-size relative-motion packets. Each
//! packet starts with a magic number; a stream that has lost alignment is
//! recovered by discarding one byte at a time until a packet lines up.
//!
//! Packet layout (12 bytes, little endian):
//!
//! | offset | size | field                        |
//! |--------|------|------------------------------|
//! | 0      | 4    | magic `0xFEED1234`           |
//! | 4      | 1    | dx (`i8`)                    |
//! | 5      | 1    | dy (`i8`, positive is up)    |
//! | 6      | 2    | padding                      |
//! | 8      | 4    | buttons                      |
//!
//! The pointer lives in sub-cell units: display pixels times a fixed
//! scale. Motion is accelerated by `floor(log2(|delta|))` per axis.

use tracing::{debug, trace};

use crate::core::Screen;
use crate::renderer::Renderer;

/// Magic number that starts every packet
pub const MOUSE_MAGIC: u32 = 0xFEED_1234;

/// Size of one packet on the wire
pub const PACKET_LEN: usize = 12;

/// Default sub-cell scale
pub const DEFAULT_MOUSE_SCALE: u32 = 6;

/// One decoded motion packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MousePacket {
    pub dx: i8,
    pub dy: i8,
    pub buttons: u32,
}

impl MousePacket {
    pub fn new(dx: i8, dy: i8, buttons: u32) -> Self {
        Self { dx, dy, buttons }
    }

    /// Wire encoding
    pub fn encode(&self) -> [u8; PACKET_LEN] {
        let mut out = [0u8; PACKET_LEN];
        out[0..4].copy_from_slice(&MOUSE_MAGIC.to_le_bytes());
        out[4] = self.dx as u8;
        out[5] = self.dy as u8;
        out[8..12].copy_from_slice(&self.buttons.to_le_bytes());
        out
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        let header: [u8; 4] = bytes.get(0..4)?.try_into().ok()?;
        if u32::from_le_bytes(header) != MOUSE_MAGIC {
            return None;
        }
        let buttons: [u8; 4] = bytes.get(8..12)?.try_into().ok()?;
        Some(Self {
            dx: bytes[4] as i8,
            dy: bytes[5] as i8,
            buttons: u32::from_le_bytes(buttons),
        })
    }
}

/// Reassembles packets from an arbitrarily chunked byte stream
#[derive(Debug, Clone, Default)]
pub struct PacketDecoder {
    buf: Vec<u8>,
    discarded: u64,
}

impl PacketDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes dropped while resynchronising
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Bytes waiting for the rest of a packet
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Next complete, valid packet
    pub fn next_packet(&mut self) -> Option<MousePacket> {
        while self.buf.len() >= PACKET_LEN {
            if let Some(packet) = MousePacket::decode(&self.buf[..PACKET_LEN]) {
                self.buf.drain(..PACKET_LEN);
                return Some(packet);
            }
            self.buf.remove(0);
            self.discarded += 1;
            trace!("mouse stream out of sync, dropped one byte");
        }
        None
    }
}

/// Acceleration factor for a raw delta: `floor(log2(|delta|))`, 0 for 0 and ±1
pub fn acceleration(delta: i8) -> i32 {
    let magnitude = delta.unsigned_abs();
    if magnitude == 0 {
        0
    } else {
        (u8::BITS - 1 - magnitude.leading_zeros()) as i32
    }
}

/// Absolute pointer state
#[derive(Debug, Clone)]
pub struct MouseTracker {
    /// Position in sub-cell units
    x: i64,
    y: i64,
    scale: u32,
    /// Display size in pixels
    display: (u32, u32),
    /// Grid size in cells
    grid: (u16, u16),
}

impl MouseTracker {
    /// Pointer over a `display` pixel area showing a `grid` of cells,
    /// starting at the centre. Zero sizes and scale are raised to 1.
    pub fn new(display: (u32, u32), grid: (u16, u16), scale: u32) -> Self {
        let scale = scale.max(1);
        let display = (display.0.max(1), display.1.max(1));
        let grid = (grid.0.max(1), grid.1.max(1));
        Self {
            x: display.0 as i64 * scale as i64 / 2,
            y: display.1 as i64 * scale as i64 / 2,
            scale,
            display,
            grid,
        }
    }

    /// Position in sub-cell units
    pub fn position(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Grid cell under the pointer
    pub fn cell(&self) -> (u16, u16) {
        let px = self.x / self.scale as i64;
        let py = self.y / self.scale as i64;
        let col = px * self.grid.0 as i64 / self.display.0 as i64;
        let row = py * self.grid.1 as i64 / self.display.1 as i64;
        (
            col.clamp(0, self.grid.0 as i64 - 1) as u16,
            row.clamp(0, self.grid.1 as i64 - 1) as u16,
        )
    }

    fn clamp(&mut self) {
        let max_x = self.display.0 as i64 * self.scale as i64 - 1;
        let max_y = self.display.1 as i64 * self.scale as i64 - 1;
        self.x = self.x.clamp(0, max_x);
        self.y = self.y.clamp(0, max_y);
    }

    /// Apply one packet's motion. Returns the cells under the pointer
    /// before and after.
    pub fn motion(&mut self, packet: &MousePacket) -> ((u16, u16), (u16, u16)) {
        let before = self.cell();
        self.x += packet.dx as i64 * acceleration(packet.dx) as i64;
        self.y -= packet.dy as i64 * acceleration(packet.dy) as i64;
        self.clamp();
        (before, self.cell())
    }

    /// Move to an absolute display pixel, as reported by a window system.
    /// Returns the cells under the pointer before and after.
    pub fn warp_to_pixel(&mut self, px: f64, py: f64) -> ((u16, u16), (u16, u16)) {
        let before = self.cell();
        self.x = (px * self.scale as f64) as i64;
        self.y = (py * self.scale as f64) as i64;
        self.clamp();
        (before, self.cell())
    }

    /// Apply a packet and update the pointer overlay: the old cell is
    /// restored, the new one drawn inverted
    pub fn apply<R: Renderer>(&mut self, packet: &MousePacket, screen: &mut Screen<R>) {
        let (before, after) = self.motion(packet);
        if packet.buttons != 0 {
            debug!(buttons = packet.buttons, "mouse buttons");
        }
        Self::redraw(screen, before, after);
    }

    /// Warp and update the pointer overlay
    pub fn apply_warp<R: Renderer>(&mut self, px: f64, py: f64, screen: &mut Screen<R>) {
        let (before, after) = self.warp_to_pixel(px, py);
        if before != after {
            Self::redraw(screen, before, after);
        }
    }

    fn redraw<R: Renderer>(screen: &mut Screen<R>, before: (u16, u16), after: (u16, u16)) {
        screen.redraw_cell(before.0, before.1);
        screen.redraw_cell_inverted(after.0, after.1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RecordingRenderer;

    #[test]
    fn test_acceleration() {
        assert_eq!(acceleration(0), 0);
        assert_eq!(acceleration(1), 0);
        assert_eq!(acceleration(-1), 0);
        assert_eq!(acceleration(2), 1);
        assert_eq!(acceleration(3), 1);
        assert_eq!(acceleration(4), 2);
        assert_eq!(acceleration(-8), 3);
        assert_eq!(acceleration(127), 6);
        assert_eq!(acceleration(-128), 7);
    }

    #[test]
    fn test_packet_round_trip_layout() {
        let bytes = MousePacket::new(-3, 5, 1).encode();
        assert_eq!(&bytes[0..4], &[0x34, 0x12, 0xED, 0xFE]);
        assert_eq!(bytes[4], 0xFD);
        assert_eq!(bytes[5], 5);
        assert_eq!(MousePacket::decode(&bytes), Some(MousePacket::new(-3, 5, 1)));
    }

    #[test]
    fn test_decoder_waits_for_full_packet() {
        let bytes = MousePacket::new(4, 0, 0).encode();
        let mut decoder = PacketDecoder::new();
        decoder.extend(&bytes[..7]);
        assert_eq!(decoder.next_packet(), None);
        decoder.extend(&bytes[7..]);
        assert_eq!(decoder.next_packet(), Some(MousePacket::new(4, 0, 0)));
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_decoder_resyncs() {
        let mut decoder = PacketDecoder::new();
        decoder.extend(&[0xAA, 0xBB, 0xCC]);
        decoder.extend(&MousePacket::new(8, 0, 0).encode());
        assert_eq!(decoder.next_packet(), Some(MousePacket::new(8, 0, 0)));
        assert_eq!(decoder.discarded(), 3);
    }

    #[test]
    fn test_pointer_starts_centred() {
        let tracker = MouseTracker::new((640, 480), (80, 24), 6);
        assert_eq!(tracker.position(), (1920, 1440));
        assert_eq!(tracker.cell(), (40, 12));
    }

    #[test]
    fn test_motion_accelerates_and_inverts_y() {
        let mut tracker = MouseTracker::new((640, 480), (80, 24), 6);
        tracker.motion(&MousePacket::new(8, 4, 0));
        // 8 * 3 right, 4 * 2 up
        assert_eq!(tracker.position(), (1920 + 24, 1440 - 8));

        // Deltas of one do not move at all
        tracker.motion(&MousePacket::new(1, -1, 0));
        assert_eq!(tracker.position(), (1944, 1432));
    }

    #[test]
    fn test_motion_clamps() {
        let mut tracker = MouseTracker::new((640, 480), (80, 24), 6);
        for _ in 0..100 {
            tracker.motion(&MousePacket::new(127, 127, 0));
        }
        assert_eq!(tracker.position(), (640 * 6 - 1, 0));
        assert_eq!(tracker.cell(), (79, 0));

        for _ in 0..100 {
            tracker.motion(&MousePacket::new(-128, -128, 0));
        }
        assert_eq!(tracker.position(), (0, 480 * 6 - 1));
        assert_eq!(tracker.cell(), (0, 23));
    }

    #[test]
    fn test_apply_redraws_old_and_new_cells() {
        let mut screen = Screen::new(80, 24, RecordingRenderer::new());
        let mut tracker = MouseTracker::new((640, 480), (80, 24), 6);
        // 127 * 6 = 762 units = 127 px = 15 cells right
        tracker.apply(&MousePacket::new(127, 0, 0), &mut screen);

        let draws = &screen.renderer().draws;
        assert_eq!(draws.len(), 2);
        assert_eq!((draws[0].x, draws[0].y), (40, 12));
        assert_eq!((draws[1].x, draws[1].y), (55, 12));
        // Inverted: empty cell shows default fg as background
        assert_eq!(draws[1].bg, screen.palette().get(crate::core::DEFAULT_FG));
    }

    #[test]
    fn test_warp() {
        let mut tracker = MouseTracker::new((800, 600), (100, 50), 6);
        tracker.warp_to_pixel(12.0, 599.5);
        assert_eq!(tracker.cell(), (1, 49));
        tracker.warp_to_pixel(-5.0, 10_000.0);
        assert_eq!(tracker.position(), (0, 600 * 6 - 1));
    }
}

//! Input handling
//!
//! - [`LineEditor`]: keyboard bytes to whole lines for the child
//! - [`MouseTracker`] / [`PacketDecoder`]: relative mouse packets to a
//!   pointer overlay on the grid
//! - [`HostKeyboard`]: raw-mode keyboard from the host terminal

mod host;
mod line_editor;
mod mouse;

pub use host::{translate_key, HostKeyboard};
pub use line_editor::{Echo, Edit, LineEditor, DEFAULT_INPUT_CAPACITY};
pub use mouse::{
    acceleration, MousePacket, MouseTracker, PacketDecoder, DEFAULT_MOUSE_SCALE, MOUSE_MAGIC,
    PACKET_LEN,
};

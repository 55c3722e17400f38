//! GUI Module
//!
//! Hosts the terminal in a window. Uses winit for window management and
//! softbuffer to present the CPU framebuffer. Key presses feed the
//! keyboard queue of the event loop; pointer motion warps the mouse
//! overlay.

use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Instant;

use softbuffer::{Context, Surface};
use tracing::{error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop as WinitEventLoop};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::app::Config;
use crate::event_loop::{EventLoop, LoopError, LoopExit, LoopIo, Step};
use crate::input::MouseTracker;
use crate::pty::{Pty, PtyError, WindowSize};
use crate::renderer::{
    BitmapFont, FontError, FramebufferRenderer, GlyphRaster, OutlineFont,
};
use crate::source::ByteQueue;
use crate::terminal::Terminal;

type WindowRenderer = FramebufferRenderer<Box<dyn GlyphRaster>>;

/// Errors that stop the window host
#[derive(Debug, thiserror::Error)]
pub enum GuiError {
    #[error("Failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("Presentation surface error: {0}")]
    Surface(#[from] softbuffer::SoftBufferError),

    #[error("Font error: {0}")]
    Font(#[from] FontError),

    #[error("Failed to spawn shell: {0}")]
    Pty(#[from] PtyError),

    #[error(transparent)]
    Loop(#[from] LoopError),

    #[error("Window has zero size")]
    ZeroSize,
}

/// Load the configured glyph source: bitmap font first, then outline
fn load_font(config: &Config) -> Result<Box<dyn GlyphRaster>, FontError> {
    if let Some(path) = &config.font.bitmap_path {
        info!("Using bitmap font {:?}", path);
        return Ok(Box::new(BitmapFont::load(path)?));
    }
    let font = match &config.font.outline_path {
        Some(path) => OutlineFont::load(path, config.font.size)?,
        None => OutlineFont::with_default_font(config.font.size)?,
    };
    Ok(Box::new(font))
}

/// Bytes for a key press, or nothing for keys the line editor ignores
pub fn key_bytes(key: &Key, text: Option<&str>, modifiers: ModifiersState) -> Vec<u8> {
    match key {
        Key::Named(NamedKey::Enter) => return vec![b'\n'],
        Key::Named(NamedKey::Backspace) => return vec![0x08],
        Key::Named(NamedKey::Tab) => return vec![b'\t'],
        Key::Named(NamedKey::Escape) => return vec![0x1b],
        Key::Character(s) if modifiers.control_key() => {
            // Ctrl+letter maps onto C0
            return s
                .chars()
                .next()
                .filter(char::is_ascii_alphabetic)
                .map(|c| vec![(c.to_ascii_lowercase() as u8) & 0x1f])
                .unwrap_or_default();
        }
        _ => {}
    }
    text.map(|t| t.as_bytes().to_vec()).unwrap_or_default()
}

/// Open a window running the configured shell. Returns when the shell
/// exits or the window closes.
pub fn run(config: &Config) -> Result<Option<LoopExit>, GuiError> {
    let font = load_font(config)?;
    let (cell_w, cell_h) = font.cell_size();
    let (cols, rows) = (config.cols, config.rows);
    let (width, height) = (cell_w * cols as u32, cell_h * rows as u32);

    let event_loop = WinitEventLoop::new()?;
    let window = Rc::new(
        WindowBuilder::new()
            .with_title("Sumi Terminal")
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false)
            .build(&event_loop)?,
    );

    let context = Context::new(window.clone())?;
    let mut surface = Surface::new(&context, window.clone())?;
    surface.resize(
        NonZeroU32::new(width).ok_or(GuiError::ZeroSize)?,
        NonZeroU32::new(height).ok_or(GuiError::ZeroSize)?,
    )?;

    let shell = config.shell();
    let size = WindowSize::with_pixels(
        cols,
        rows,
        width.min(u16::MAX as u32) as u16,
        height.min(u16::MAX as u32) as u16,
    );
    let pty = Pty::spawn(&shell, &[], size)?;
    info!("Spawned shell: {}", shell);

    let renderer: WindowRenderer = FramebufferRenderer::new(font, cols, rows);
    let mut terminal = Terminal::configured(
        cols,
        rows,
        renderer,
        config.palette.clone(),
        config.blink_ticks,
    );
    terminal.screen_mut().redraw_all();

    let mut lp = EventLoop::new(terminal)
        .with_input_capacity(config.input_capacity)
        .with_tick_interval(config.tick_interval())
        .with_mouse(MouseTracker::new(
            (width, height),
            (cols, rows),
            config.mouse_scale,
        ));
    let mut io = LoopIo::new(pty.output(), pty.input(), ByteQueue::new(), None::<ByteQueue>);

    let mut modifiers = ModifiersState::empty();
    let mut outcome: Result<Option<LoopExit>, GuiError> = Ok(None);

    event_loop.run(|event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested => {
                info!("Window close requested");
                elwt.exit();
            }
            WindowEvent::ModifiersChanged(mods) => modifiers = mods.state(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        text,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                let bytes = key_bytes(&logical_key, text.as_deref(), modifiers);
                io.keyboard.push(&bytes);
            }
            WindowEvent::CursorMoved { position, .. } => {
                lp.warp_pointer(position.x, position.y);
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = present(&mut surface, lp.terminal().screen().renderer()) {
                    warn!("Failed to present frame: {}", e);
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            match lp.iterate(&mut io) {
                Ok(Step::Exit(exit)) => {
                    info!(?exit, "Shell session ended");
                    outcome = Ok(Some(exit));
                    elwt.exit();
                }
                Ok(step) => {
                    let next = match step {
                        Step::Busy => ControlFlow::Poll,
                        _ => ControlFlow::WaitUntil(Instant::now() + lp.tick_interval()),
                    };
                    elwt.set_control_flow(next);
                }
                Err(e) => {
                    error!("Event loop error: {}", e);
                    outcome = Err(e.into());
                    elwt.exit();
                }
            }
            if lp.terminal_mut().screen_mut().renderer_mut().take_frame() {
                window.request_redraw();
            }
        }
        _ => {}
    })?;

    outcome
}

/// Copy the framebuffer to the window surface
fn present(
    surface: &mut Surface<Rc<Window>, Rc<Window>>,
    renderer: &WindowRenderer,
) -> Result<(), softbuffer::SoftBufferError> {
    let pixels = renderer.framebuffer().pixels();
    let mut buffer = surface.buffer_mut()?;
    let n = buffer.len().min(pixels.len());
    buffer[..n].copy_from_slice(&pixels[..n]);
    buffer.present()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_keys() {
        let none = ModifiersState::empty();
        assert_eq!(key_bytes(&Key::Named(NamedKey::Enter), None, none), b"\n");
        assert_eq!(key_bytes(&Key::Named(NamedKey::Backspace), None, none), [0x08]);
        assert_eq!(key_bytes(&Key::Named(NamedKey::Tab), None, none), b"\t");
    }

    #[test]
    fn test_text_passes_through() {
        let none = ModifiersState::empty();
        assert_eq!(
            key_bytes(&Key::Named(NamedKey::Space), Some(" "), none),
            b" "
        );
        assert!(key_bytes(&Key::Named(NamedKey::ArrowUp), None, none).is_empty());
    }

    #[test]
    fn test_ctrl_c_is_etx() {
        let key = Key::Character("c".into());
        assert_eq!(key_bytes(&key, Some("c"), ModifiersState::CONTROL), [0x03]);
    }
}

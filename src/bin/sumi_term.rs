//! Sumi Terminal
//!
//! Runs a shell on a pseudoterminal. By default the screen is mirrored
//! onto the host terminal; with `--gui` it is shown in a window.

use std::io;
use std::os::fd::AsRawFd;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use sumi_terminal::app::{logging, Config};
use sumi_terminal::input::{HostKeyboard, MouseTracker};
use sumi_terminal::pty::{get_window_size, Pty, WindowSize};
use sumi_terminal::renderer::AnsiRenderer;
use sumi_terminal::source::FdSource;
use sumi_terminal::{EventLoop, LoopExit, LoopIo, Terminal};

#[derive(Parser, Debug)]
#[command(name = "sumi-term")]
#[command(version)]
#[command(about = "A small terminal emulator", long_about = None)]
struct Args {
    /// Configuration file (default: ~/.config/sumi/config.json)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Shell to run
    #[arg(short, long, value_name = "SHELL")]
    shell: Option<String>,

    /// Relative mouse packet device
    #[arg(long, value_name = "PATH")]
    mouse_device: Option<PathBuf>,

    /// Write logs here instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Open a window instead of using the host terminal
    #[arg(long)]
    gui: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = logging::init("warn", args.log_file.as_deref()) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let mut config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config {:?}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::load_or_default(),
    };
    if let Some(shell) = args.shell {
        config.shell = Some(shell);
    }

    info!("Sumi Terminal starting...");

    if args.gui {
        return run_gui(&config);
    }

    match run_host(&config, args.mouse_device) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("sumi-term: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "gui")]
fn run_gui(config: &Config) -> ExitCode {
    match sumi_terminal::gui::run(config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Error: {}", e);
            eprintln!("sumi-term: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "gui"))]
fn run_gui(_config: &Config) -> ExitCode {
    eprintln!("The window frontend requires the 'gui' feature.");
    eprintln!("Build with: cargo build --features gui");
    ExitCode::FAILURE
}

/// Mirror the terminal onto the host terminal until the shell exits
fn run_host(
    config: &Config,
    mouse_device: Option<PathBuf>,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    // Fill the host terminal when its size is known
    let (cols, rows) = match get_window_size(stdout.as_raw_fd()) {
        Ok(size) if size.cols > 0 && size.rows > 0 => (size.cols, size.rows),
        _ => (config.cols, config.rows),
    };

    let shell = config.shell();
    let mut pty = Pty::spawn(&shell, &[], WindowSize::new(cols, rows))?;

    let keyboard = HostKeyboard::open()?;
    if !keyboard.is_raw() {
        warn!("stdin is not a terminal, reading it as a plain stream");
    }

    let mouse = match mouse_device {
        Some(path) => match FdSource::open(&path) {
            Ok(source) => Some(source),
            Err(e) => {
                warn!("Failed to open mouse device {:?}: {}", path, e);
                None
            }
        },
        None => None,
    };

    let mut renderer = AnsiRenderer::new(stdout.lock());
    renderer.enter()?;
    let terminal = Terminal::configured(
        cols,
        rows,
        renderer,
        config.palette.clone(),
        config.blink_ticks,
    );
    let mut lp = EventLoop::new(terminal)
        .with_input_capacity(config.input_capacity)
        .with_tick_interval(config.tick_interval())
        .with_mouse(MouseTracker::new(
            (cols as u32 * 8, rows as u32 * 16),
            (cols, rows),
            config.mouse_scale,
        ));
    lp.terminal_mut().screen_mut().redraw_all();

    let result = {
        let mut io = LoopIo::new(pty.output(), pty.input(), keyboard, mouse);
        lp.run(&mut io)
    };

    let mut renderer = lp.into_terminal().into_renderer();
    if let Some(e) = renderer.take_error() {
        warn!("Host terminal write failed during the session: {}", e);
    }
    renderer.leave()?;

    match result? {
        LoopExit::ChildExited => {
            let code = pty.wait().unwrap_or(1);
            info!(code, "Shell exited");
            Ok(ExitCode::from(code.clamp(0, 255) as u8))
        }
        LoopExit::KeyboardClosed => {
            info!("Keyboard closed, interrupting shell");
            let _ = pty.interrupt();
            Ok(ExitCode::SUCCESS)
        }
    }
}

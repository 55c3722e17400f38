//! Sumi Headless Terminal Runner
//!
//! Feeds a byte stream through the terminal without a display and prints
//! the resulting screen, as JSON or plain text.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use sumi_terminal::app::logging;
use sumi_terminal::renderer::NullRenderer;
use sumi_terminal::Terminal;

#[derive(Parser, Debug)]
#[command(name = "sumi-headless")]
#[command(version)]
#[command(about = "Run bytes through the terminal and print the screen", long_about = None)]
struct Args {
    /// Input file (stdin when omitted)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Grid width
    #[arg(short, long, default_value_t = 80)]
    cols: u16,

    /// Grid height
    #[arg(short, long, default_value_t = 24)]
    rows: u16,

    /// Print plain text rows instead of a JSON snapshot
    #[arg(short, long)]
    text: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = logging::init("info", None) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let input = match &args.input {
        Some(path) => std::fs::read(path).map_err(|e| format!("Error reading {:?}: {}", path, e)),
        None => {
            let mut data = Vec::new();
            io::stdin()
                .read_to_end(&mut data)
                .map(|_| data)
                .map_err(|e| format!("Error reading stdin: {}", e))
        }
    };
    let input = match input {
        Ok(data) => data,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    let mut terminal = Terminal::new(args.cols.max(1), args.rows.max(1), NullRenderer);
    terminal.feed(&input);
    tracing::info!(bytes = input.len(), "processed input");

    let snapshot = terminal.snapshot();
    if args.text {
        print!("{}", snapshot.to_text());
        return ExitCode::SUCCESS;
    }
    match snapshot.to_json() {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing snapshot: {}", e);
            ExitCode::FAILURE
        }
    }
}

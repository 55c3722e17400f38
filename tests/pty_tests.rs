//! End-to-end tests with a real child on a pseudoterminal

use std::time::Duration;

use sumi_terminal::pty::{Pty, WindowSize};
use sumi_terminal::renderer::NullRenderer;
use sumi_terminal::source::ByteQueue;
use sumi_terminal::{EventLoop, LoopExit, LoopIo, Step, Terminal};

fn event_loop(cols: u16, rows: u16) -> EventLoop<NullRenderer> {
    EventLoop::new(Terminal::new(cols, rows, NullRenderer))
        .with_tick_interval(Duration::from_millis(5))
}

#[test]
fn test_child_output_lands_on_grid() {
    let pty = Pty::spawn("/bin/echo", &["hello from the child"], WindowSize::new(40, 5))
        .expect("Failed to spawn PTY");
    let mut lp = event_loop(40, 5);
    let mut io = LoopIo::new(pty.output(), pty.input(), ByteQueue::new(), None::<ByteQueue>);

    assert_eq!(lp.run(&mut io).unwrap(), LoopExit::ChildExited);
    assert_eq!(
        lp.terminal().screen().grid().row_text(0),
        "hello from the child"
    );
}

#[test]
fn test_colored_output_from_shell() {
    let pty = Pty::spawn(
        "/bin/sh",
        &["-c", "printf '\\033[1;31mred\\033[0m plain'"],
        WindowSize::new(40, 5),
    )
    .expect("Failed to spawn PTY");
    let mut lp = event_loop(40, 5);
    let mut io = LoopIo::new(pty.output(), pty.input(), ByteQueue::new(), None::<ByteQueue>);

    assert_eq!(lp.run(&mut io).unwrap(), LoopExit::ChildExited);
    let grid = lp.terminal().screen().grid();
    assert_eq!(grid.row_text(0), "red plain");
    assert_eq!(grid.cell(0, 0).unwrap().fg, 9);
    assert_eq!(grid.cell(4, 0).unwrap().fg, 7);
}

#[test]
fn test_typed_line_reaches_shell() {
    let mut pty = Pty::spawn(
        "/bin/sh",
        &["-c", "read a b; echo sum=$((a+b))"],
        WindowSize::new(60, 10),
    )
    .expect("Failed to spawn PTY");
    let mut lp = event_loop(60, 10);
    {
        let mut io = LoopIo::new(pty.output(), pty.input(), ByteQueue::new(), None::<ByteQueue>);
        io.keyboard.push(b"40 2\n");
        assert_eq!(lp.run(&mut io).unwrap(), LoopExit::ChildExited);
    }
    assert_eq!(pty.wait().unwrap(), 0);

    // The typed line shows up once, from local echo only
    let text = lp.terminal().snapshot().to_text();
    assert_eq!(text.matches("40 2").count(), 1, "screen was:\n{}", text);
    let grid = lp.terminal().screen().grid();
    assert_eq!(grid.row_text(0), "40 2");
    assert_eq!(grid.row_text(1), "sum=42");
}

#[test]
fn test_echo_off_hides_typed_line() {
    let pty = Pty::spawn(
        "/bin/sh",
        &["-c", "printf '\\033[1001z'; read l; echo \"[$l]\""],
        WindowSize::new(40, 5),
    )
    .expect("Failed to spawn PTY");
    let mut lp = event_loop(40, 5);
    let mut io = LoopIo::new(pty.output(), pty.input(), ByteQueue::new(), None::<ByteQueue>);

    // Let the child switch local echo off before anything is typed
    while lp.terminal().parser().local_echo() {
        assert_ne!(lp.iterate(&mut io).unwrap(), Step::Exit(LoopExit::ChildExited));
        std::thread::sleep(Duration::from_millis(5));
    }
    io.keyboard.push(b"abc\n");
    assert_eq!(lp.run(&mut io).unwrap(), LoopExit::ChildExited);

    let text = lp.terminal().snapshot().to_text();
    assert_eq!(text.matches("abc").count(), 1, "screen was:\n{}", text);
    assert_eq!(lp.terminal().screen().grid().row_text(0), "[abc]");
}

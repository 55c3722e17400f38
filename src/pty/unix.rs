//! Unix PTY implementation
//!
//! Implements PTY creation and child process management using POSIX APIs.

use std::ffi::{CString, NulError};
use std::io;
use std::os::fd::BorrowedFd;
use std::os::unix::ffi::OsStringExt;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::{fcntl, open, FcntlArg, OFlag};
use nix::libc::{self, STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::poll::{poll, PollFd, PollFlags};
use nix::pty::{grantpt, posix_openpt, ptsname, unlockpt, PtyMaster};
use nix::sys::signal::{killpg, Signal};
use nix::sys::stat::Mode;
use nix::sys::termios::{self, LocalFlags, SetArg};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{close, dup2, execve, fork, read, setsid, write, ForkResult, Pid};
use tracing::{debug, info};

use super::{PtyError, PtyResult, WindowSize, CHILD_TERM};
use crate::source::{ByteSource, ChildSink, ReadOutcome};

/// How long a write waits for the master to drain before retrying
const WRITE_POLL_MS: i32 = 100;

/// A pseudoterminal with a spawned child process
#[derive(Debug)]
pub struct Pty {
    /// The PTY master file descriptor
    master: PtyMaster,
    /// The child process ID
    child_pid: Pid,
    /// Whether the child is still running
    child_alive: bool,
}

impl Pty {
    /// Spawn `shell` with `args` on a new PTY of the given size
    pub fn spawn(shell: &str, args: &[&str], size: WindowSize) -> PtyResult<Self> {
        // Everything the child needs is built before forking
        let program = CString::new(resolve_program(shell).into_os_string().into_vec())?;
        let mut argv: Vec<CString> = Vec::with_capacity(args.len() + 1);
        argv.push(CString::new(shell)?);
        for arg in args {
            argv.push(CString::new(*arg)?);
        }
        let envp = child_env()?;
        let failure = format!("sumi: cannot run {}: ", shell);

        let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).map_err(PtyError::OpenMaster)?;
        grantpt(&master).map_err(PtyError::GrantPty)?;
        unlockpt(&master).map_err(PtyError::UnlockPty)?;

        // SAFETY: ptsname is not thread-safe, but we're calling it immediately
        // after unlockpt and before any other thread could interfere
        let slave_name = unsafe { ptsname(&master) }.map_err(PtyError::PtsName)?;

        set_window_size(master.as_raw_fd(), size)?;

        // SAFETY: the child makes raw syscalls on data built before the fork,
        // without allocating, and leaves through exec or _exit
        match unsafe { fork() }.map_err(PtyError::Fork)? {
            ForkResult::Child => {
                drop(master);
                let errno = exec_child(&slave_name, &program, &argv, &envp);
                let _ = write(STDERR_FILENO, failure.as_bytes());
                let _ = write(STDERR_FILENO, errno.desc().as_bytes());
                let _ = write(STDERR_FILENO, b"\n");
                // SAFETY: leave the forked copy without running the parent's destructors
                unsafe { libc::_exit(127) }
            }
            ForkResult::Parent { child } => {
                let fd = master.as_raw_fd();
                let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(PtyError::SetNonBlocking)?;
                let flags = OFlag::from_bits_truncate(flags);
                fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))
                    .map_err(PtyError::SetNonBlocking)?;

                info!(shell, pid = child.as_raw(), "spawned child");
                Ok(Pty {
                    master,
                    child_pid: child,
                    child_alive: true,
                })
            }
        }
    }

    /// Spawn the user's default shell
    pub fn spawn_shell(size: WindowSize) -> PtyResult<Self> {
        let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
        Self::spawn(&shell, &[], size)
    }

    /// Get the raw file descriptor of the PTY master
    pub fn master_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }

    /// Get the child process ID
    pub fn child_pid(&self) -> Pid {
        self.child_pid
    }

    /// The child's output stream
    pub fn output(&self) -> PtyOutput<'_> {
        PtyOutput { pty: self }
    }

    /// The child's input stream
    pub fn input(&self) -> PtyInput<'_> {
        PtyInput { pty: self }
    }

    /// Check if the child process is still running
    pub fn is_alive(&mut self) -> bool {
        if !self.child_alive {
            return false;
        }

        match waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => true,
            _ => {
                self.child_alive = false;
                false
            }
        }
    }

    /// Wait for the child process to exit, returning its exit code
    pub fn wait(&mut self) -> PtyResult<i32> {
        if !self.child_alive {
            return Ok(0);
        }

        match waitpid(self.child_pid, None).map_err(PtyError::Wait)? {
            WaitStatus::Exited(_, code) => {
                self.child_alive = false;
                Ok(code)
            }
            WaitStatus::Signaled(_, signal, _) => {
                self.child_alive = false;
                Err(PtyError::ChildSignaled(signal as i32))
            }
            _ => Ok(0),
        }
    }

    /// Read from the master without blocking
    pub fn read_nonblocking(&self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        match read(self.master.as_raw_fd(), buf) {
            Ok(0) => Ok(ReadOutcome::Closed),
            Ok(n) => Ok(ReadOutcome::Data(n)),
            Err(Errno::EAGAIN) | Err(Errno::EINTR) => Ok(ReadOutcome::WouldBlock),
            // Linux reports a hung-up slave as EIO rather than end of file
            Err(Errno::EIO) => Ok(ReadOutcome::Closed),
            Err(e) => Err(e.into()),
        }
    }

    /// Write all of `data`, waiting for the master to drain when it is full
    pub fn write_all(&self, mut data: &[u8]) -> io::Result<()> {
        while !data.is_empty() {
            match write(self.master.as_raw_fd(), data) {
                Ok(n) => data = &data[n..],
                Err(Errno::EAGAIN) => {
                    self.poll(PollFlags::POLLOUT, WRITE_POLL_MS)?;
                }
                Err(Errno::EINTR) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Wait up to `timeout_ms` for output. Returns whether any is ready.
    pub fn poll_read(&self, timeout_ms: i32) -> io::Result<bool> {
        self.poll(PollFlags::POLLIN, timeout_ms)
    }

    fn poll(&self, events: PollFlags, timeout_ms: i32) -> io::Result<bool> {
        // SAFETY: The master fd is valid for the lifetime of this Pty
        let borrowed_fd = unsafe { BorrowedFd::borrow_raw(self.master.as_raw_fd()) };
        let mut fds = [PollFd::new(&borrowed_fd, events)];
        let n = poll(&mut fds, timeout_ms)?;
        Ok(n > 0 && fds[0].revents().is_some_and(|r| r.intersects(events)))
    }

    /// Resize the PTY
    pub fn resize(&self, size: WindowSize) -> PtyResult<()> {
        set_window_size(self.master.as_raw_fd(), size)
    }

    /// Send SIGINT to the child's process group
    pub fn interrupt(&self) -> PtyResult<()> {
        debug!(pid = self.child_pid.as_raw(), "sending SIGINT");
        killpg(self.child_pid, Signal::SIGINT).map_err(PtyError::Signal)
    }
}

impl Drop for Pty {
    fn drop(&mut self) {
        // Try to reap the child process
        if self.child_alive {
            let _ = waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG));
        }
    }
}

/// Child output, for the event loop
#[derive(Debug, Clone, Copy)]
pub struct PtyOutput<'a> {
    pty: &'a Pty,
}

impl ByteSource for PtyOutput<'_> {
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        self.pty.read_nonblocking(buf)
    }
}

/// Child input, for the line editor
#[derive(Debug, Clone, Copy)]
pub struct PtyInput<'a> {
    pty: &'a Pty,
}

impl ChildSink for PtyInput<'_> {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.pty.write_all(bytes)
    }

    fn interrupt(&mut self) -> io::Result<()> {
        self.pty.interrupt().map_err(io::Error::other)
    }
}

/// Runs in the forked child. Only returns if something failed.
fn exec_child(slave_name: &str, program: &CString, argv: &[CString], envp: &[CString]) -> Errno {
    if let Err(e) = setsid() {
        return e;
    }

    // Opening the slave after setsid makes it the controlling terminal
    let slave_fd = match open(slave_name, OFlag::O_RDWR, Mode::empty()) {
        Ok(fd) => fd,
        Err(e) => return e,
    };

    // SAFETY: TIOCSCTTY is a valid ioctl for setting controlling terminal.
    // Failure is fine: Linux already did it on open.
    unsafe {
        libc::ioctl(slave_fd, libc::TIOCSCTTY as _, 0);
    }

    // Typed input is echoed by the terminal's line editor, never by the
    // line discipline
    // SAFETY: slave_fd was opened above and is not closed while borrowed
    let slave = unsafe { BorrowedFd::borrow_raw(slave_fd) };
    let mut attrs = match termios::tcgetattr(slave) {
        Ok(attrs) => attrs,
        Err(e) => return e,
    };
    attrs.local_flags.remove(LocalFlags::ECHO | LocalFlags::ECHONL);
    if let Err(e) = termios::tcsetattr(slave, SetArg::TCSANOW, &attrs) {
        return e;
    }

    for target in [STDIN_FILENO, STDOUT_FILENO, STDERR_FILENO] {
        if let Err(e) = dup2(slave_fd, target) {
            return e;
        }
    }
    if slave_fd > STDERR_FILENO {
        let _ = close(slave_fd);
    }

    match execve(program, argv, envp) {
        Err(e) => e,
        Ok(never) => match never {},
    }
}

/// Find `program` on `$PATH` the way a shell would. Names containing a
/// slash are used as they are; a name not found is returned unchanged and
/// exec reports it.
fn resolve_program(program: &str) -> PathBuf {
    if program.contains('/') {
        return PathBuf::from(program);
    }
    std::env::var_os("PATH")
        .and_then(|path| {
            std::env::split_paths(&path)
                .map(|dir| dir.join(program))
                .find(|candidate| is_executable(candidate))
        })
        .unwrap_or_else(|| PathBuf::from(program))
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// The parent's environment with `TERM` replaced and `COLORTERM` removed
fn child_env() -> Result<Vec<CString>, NulError> {
    let mut env = Vec::new();
    for (key, value) in std::env::vars_os() {
        if key == "TERM" || key == "COLORTERM" {
            continue;
        }
        let mut entry = key.into_vec();
        entry.push(b'=');
        entry.extend(value.into_vec());
        env.push(CString::new(entry)?);
    }
    env.push(CString::new(format!("TERM={}", CHILD_TERM))?);
    Ok(env)
}

/// Set the window size on a PTY file descriptor
fn set_window_size(fd: RawFd, size: WindowSize) -> PtyResult<()> {
    let winsize = libc::winsize {
        ws_row: size.rows,
        ws_col: size.cols,
        ws_xpixel: size.pixel_width,
        ws_ypixel: size.pixel_height,
    };

    // SAFETY: TIOCSWINSZ is a valid ioctl for setting window size
    let result = unsafe { libc::ioctl(fd, libc::TIOCSWINSZ, &winsize) };

    if result < 0 {
        Err(PtyError::SetWinsize(Errno::last()))
    } else {
        Ok(())
    }
}

/// Get the window size from a PTY file descriptor
pub fn get_window_size(fd: RawFd) -> PtyResult<WindowSize> {
    let mut winsize = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };

    // SAFETY: TIOCGWINSZ is a valid ioctl for getting window size
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut winsize) };

    if result < 0 {
        Err(PtyError::SetWinsize(Errno::last()))
    } else {
        Ok(WindowSize {
            rows: winsize.ws_row,
            cols: winsize.ws_col,
            pixel_width: winsize.ws_xpixel,
            pixel_height: winsize.ws_ypixel,
        })
    }
}

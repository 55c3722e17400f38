//! Keyboard input from the host terminal
//!
//! Puts the controlling terminal's stdin into raw, non-blocking mode for
//! the lifetime of a [`HostKeyboard`] and restores it on drop. Raw mode
//! delivers Ctrl-C as a plain ETX byte, which the line editor turns into
//! an interrupt for the child.

use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};

use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::termios::{self, SetArg, Termios};

use crate::source::{classify, ByteSource, ReadOutcome};

/// Map host key bytes onto what the line editor expects: DEL becomes
/// backspace and carriage return becomes newline
pub fn translate_key(byte: u8) -> u8 {
    match byte {
        0x7F => 0x08,
        b'\r' => b'\n',
        other => other,
    }
}

/// Raw-mode stdin
pub struct HostKeyboard {
    stdin: File,
    /// Saved terminal settings, `None` when stdin is not a terminal
    original: Option<Termios>,
    original_flags: OFlag,
}

impl std::fmt::Debug for HostKeyboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostKeyboard")
            .field("raw", &self.original.is_some())
            .finish()
    }
}

impl HostKeyboard {
    /// Take over stdin. Raw mode is only applied when stdin is a terminal.
    pub fn open() -> io::Result<Self> {
        let fd: OwnedFd = io::stdin().as_fd().try_clone_to_owned()?;
        Self::from_file(File::from(fd))
    }

    fn from_file(stdin: File) -> io::Result<Self> {
        let flags = fcntl(stdin.as_raw_fd(), FcntlArg::F_GETFL).map_err(io::Error::from)?;
        let original_flags = OFlag::from_bits_truncate(flags);
        fcntl(
            stdin.as_raw_fd(),
            FcntlArg::F_SETFL(original_flags | OFlag::O_NONBLOCK),
        )
        .map_err(io::Error::from)?;

        // From here on, Drop puts the flags back, even if raw mode fails
        let mut keyboard = Self {
            stdin,
            original: None,
            original_flags,
        };

        match termios::tcgetattr(keyboard.stdin.as_fd()) {
            Ok(saved) => {
                let mut raw = saved.clone();
                termios::cfmakeraw(&mut raw);
                termios::tcsetattr(keyboard.stdin.as_fd(), SetArg::TCSAFLUSH, &raw)
                    .map_err(io::Error::from)?;
                keyboard.original = Some(saved);
            }
            Err(e) => {
                tracing::debug!("stdin is not a terminal ({}), leaving it cooked", e);
            }
        }

        Ok(keyboard)
    }

    /// Whether the host terminal was switched to raw mode
    pub fn is_raw(&self) -> bool {
        self.original.is_some()
    }
}

impl ByteSource for HostKeyboard {
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        let outcome = classify(self.stdin.read(buf))?;
        if let ReadOutcome::Data(n) = outcome {
            for byte in &mut buf[..n] {
                *byte = translate_key(*byte);
            }
        }
        Ok(outcome)
    }
}

impl Drop for HostKeyboard {
    fn drop(&mut self) {
        if let Some(original) = &self.original {
            let _ = termios::tcsetattr(self.stdin.as_fd(), SetArg::TCSAFLUSH, original);
        }
        let _ = fcntl(
            self.stdin.as_raw_fd(),
            FcntlArg::F_SETFL(self.original_flags),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_key() {
        assert_eq!(translate_key(0x7F), 0x08);
        assert_eq!(translate_key(b'\r'), b'\n');
        assert_eq!(translate_key(b'a'), b'a');
        assert_eq!(translate_key(0x03), 0x03);
    }

    fn flags(file: &File) -> OFlag {
        OFlag::from_bits_truncate(fcntl(file.as_raw_fd(), FcntlArg::F_GETFL).unwrap())
    }

    #[test]
    fn test_drop_restores_blocking_mode() {
        let file = tempfile::tempfile().unwrap();
        let shared = file.try_clone().unwrap();

        let keyboard = HostKeyboard::from_file(file).unwrap();
        assert!(!keyboard.is_raw());
        assert!(flags(&shared).contains(OFlag::O_NONBLOCK));

        drop(keyboard);
        assert!(!flags(&shared).contains(OFlag::O_NONBLOCK));
    }
}

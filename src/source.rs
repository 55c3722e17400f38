//! Byte sources and sinks
//!
//! The event loop never blocks on a read. Each source reports whether it
//! had data, had nothing right now, or has closed for good. Anything that
//! can produce bytes (a pty, a device file, an in-memory queue filled by
//! a window system) plugs in through [`ByteSource`].

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use nix::fcntl::{fcntl, FcntlArg, OFlag};

/// Result of a non-blocking read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were read into the buffer (`n > 0`)
    Data(usize),
    /// Nothing available right now
    WouldBlock,
    /// The source has reached end of stream
    Closed,
}

/// A readable stream that never blocks
pub trait ByteSource {
    /// Read whatever is available into `buf`
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        (**self).read_nonblocking(buf)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        (**self).read_nonblocking(buf)
    }
}

/// Where completed input lines go: the child's input stream
pub trait ChildSink {
    /// Write bytes to the child
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Deliver an interrupt to the child
    fn interrupt(&mut self) -> io::Result<()>;
}

impl<C: ChildSink + ?Sized> ChildSink for &mut C {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).send(bytes)
    }

    fn interrupt(&mut self) -> io::Result<()> {
        (**self).interrupt()
    }
}

impl<C: ChildSink + ?Sized> ChildSink for Box<C> {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).send(bytes)
    }

    fn interrupt(&mut self) -> io::Result<()> {
        (**self).interrupt()
    }
}

/// Map a raw read result onto [`ReadOutcome`]
pub(crate) fn classify(result: io::Result<usize>) -> io::Result<ReadOutcome> {
    match result {
        Ok(0) => Ok(ReadOutcome::Closed),
        Ok(n) => Ok(ReadOutcome::Data(n)),
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(ReadOutcome::WouldBlock),
        Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(ReadOutcome::WouldBlock),
        Err(e) => Err(e),
    }
}

/// Put a file descriptor into non-blocking mode
pub fn set_nonblocking(fd: BorrowedFd<'_>) -> io::Result<()> {
    let raw = fd.as_raw_fd();
    let flags = fcntl(raw, FcntlArg::F_GETFL).map_err(io::Error::from)?;
    let flags = OFlag::from_bits_truncate(flags) | OFlag::O_NONBLOCK;
    fcntl(raw, FcntlArg::F_SETFL(flags)).map_err(io::Error::from)?;
    Ok(())
}

/// An in-memory byte queue
///
/// Producers push bytes; the loop drains them. Once closed and empty the
/// queue reports [`ReadOutcome::Closed`].
#[derive(Debug, Clone, Default)]
pub struct ByteQueue {
    data: VecDeque<u8>,
    closed: bool,
}

impl ByteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue pre-filled with `bytes`
    pub fn with_bytes(bytes: &[u8]) -> Self {
        let mut queue = Self::new();
        queue.push(bytes);
        queue
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.data.extend(bytes);
    }

    /// No more bytes will be pushed
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ByteSource for ByteQueue {
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        if self.data.is_empty() {
            return Ok(if self.closed {
                ReadOutcome::Closed
            } else {
                ReadOutcome::WouldBlock
            });
        }
        let n = buf.len().min(self.data.len());
        for (slot, byte) in buf.iter_mut().zip(self.data.drain(..n)) {
            *slot = byte;
        }
        Ok(ReadOutcome::Data(n))
    }
}

/// A file or device opened for non-blocking reads
#[derive(Debug)]
pub struct FdSource {
    file: File,
}

impl FdSource {
    /// Open `path` read-only and non-blocking
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)?;
        Ok(Self { file })
    }

    /// Wrap an already open descriptor, switching it to non-blocking mode
    pub fn from_fd(fd: OwnedFd) -> io::Result<Self> {
        set_nonblocking(fd.as_fd())?;
        Ok(Self {
            file: File::from(fd),
        })
    }
}

impl AsFd for FdSource {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl ByteSource for FdSource {
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
        classify(self.file.read(buf))
    }
}

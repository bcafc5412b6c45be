/*!
 * Pipe Implementation
 * Kernel pipe endpoints owned through scoped descriptor guards
 */

use super::types::{PipeError, PipeResult};
use crate::core::guard::FdGuard;
use crate::core::types::Fd;
use nix::fcntl::OFlag;
use std::io::{self, Read, Write};
use std::os::unix::io::OwnedFd;
use tracing::debug;

pub(crate) const READ_LABEL: &str = "pipe.read";
pub(crate) const WRITE_LABEL: &str = "pipe.write";

/// A freshly allocated unidirectional pipe
///
/// Bytes written to `writer` are read from `reader` in write order, once,
/// without message boundaries.
#[derive(Debug)]
pub struct PipePair {
    pub reader: PipeReader,
    pub writer: PipeWriter,
}

impl PipePair {
    /// Allocate a new pipe
    pub fn new() -> PipeResult<Self> {
        let (read_end, write_end) =
            nix::unistd::pipe().map_err(|errno| PipeError::ResourceExhausted { errno })?;
        Ok(Self::from_fds(read_end, write_end))
    }

    /// Allocate a pipe whose endpoints are closed automatically by a successful exec
    pub fn close_on_exec() -> PipeResult<Self> {
        let (read_end, write_end) = nix::unistd::pipe2(OFlag::O_CLOEXEC)
            .map_err(|errno| PipeError::ResourceExhausted { errno })?;
        Ok(Self::from_fds(read_end, write_end))
    }

    fn from_fds(read_end: OwnedFd, write_end: OwnedFd) -> Self {
        let reader = PipeReader {
            guard: FdGuard::new(read_end, READ_LABEL),
        };
        let writer = PipeWriter {
            guard: FdGuard::new(write_end, WRITE_LABEL),
        };

        debug!(
            read_fd = reader.raw_fd(),
            write_fd = writer.raw_fd(),
            "Allocated pipe"
        );

        Self { reader, writer }
    }

    /// Split into the two independently owned endpoints
    #[inline]
    pub fn into_parts(self) -> (PipeReader, PipeWriter) {
        (self.reader, self.writer)
    }
}

/// Read end of a pipe
#[derive(Debug)]
pub struct PipeReader {
    guard: FdGuard,
}

impl PipeReader {
    #[inline]
    pub fn raw_fd(&self) -> Fd {
        self.guard.raw_fd()
    }

    /// Close this endpoint now instead of at drop
    pub fn close(self) -> PipeResult<()> {
        self.guard
            .close_early()
            .map_err(PipeError::endpoint(READ_LABEL))
    }

    pub(crate) fn into_guard(self) -> FdGuard {
        self.guard
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut file = self.guard.file()?;
        file.read(buf)
    }
}

/// Write end of a pipe
#[derive(Debug)]
pub struct PipeWriter {
    guard: FdGuard,
}

impl PipeWriter {
    #[inline]
    pub fn raw_fd(&self) -> Fd {
        self.guard.raw_fd()
    }

    /// Close this endpoint now, signalling end-of-stream once no other copy is open
    pub fn close(self) -> PipeResult<()> {
        self.guard
            .close_early()
            .map_err(PipeError::endpoint(WRITE_LABEL))
    }

    pub(crate) fn into_guard(self) -> FdGuard {
        self.guard
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self.guard.file()?;
        file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

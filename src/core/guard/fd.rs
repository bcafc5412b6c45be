/*!
 * File Descriptor Guards
 *
 * RAII guards for file descriptors with automatic cleanup
 */

use super::{GuardError, GuardMetadata, GuardResult};
use crate::core::types::Fd;
use std::fs::File;
use std::os::unix::io::{AsRawFd, IntoRawFd, OwnedFd};
use tracing::{debug, error};

/// File descriptor guard with automatic close
///
/// # Example
///
/// ```rust,ignore
/// let fd_guard = FdGuard::new(owned_fd, "pipe.read");
/// let fd = fd_guard.raw_fd();
/// // Use file descriptor
/// // Automatically closed on drop
/// ```
pub struct FdGuard {
    file: Option<File>,
    raw: Fd,
    metadata: GuardMetadata,
}

impl FdGuard {
    /// Take ownership of a descriptor
    pub fn new(fd: OwnedFd, label: &'static str) -> Self {
        Self::from_file(File::from(fd), label)
    }

    /// Take ownership of an already opened file
    pub fn from_file(file: File, label: &'static str) -> Self {
        let guard = Self {
            raw: file.as_raw_fd(),
            file: Some(file),
            metadata: GuardMetadata::new("fd", label),
        };

        debug!(fd = guard.raw, label = guard.metadata.label, "fd opened");
        guard
    }

    /// Get the descriptor number (stays valid only while the guard is active)
    #[inline]
    pub fn raw_fd(&self) -> Fd {
        self.raw
    }

    /// Endpoint label used in logs
    #[inline]
    pub fn label(&self) -> &'static str {
        self.metadata.label
    }

    /// Borrow the descriptor as a file for I/O
    pub fn file(&self) -> GuardResult<&File> {
        self.file.as_ref().ok_or(GuardError::AlreadyReleased)
    }

    /// Manually close the file descriptor early
    pub fn close_early(mut self) -> GuardResult<()> {
        self.release()
    }

    /// Give up ownership without closing, leaving the descriptor open in this process
    pub fn into_raw_fd(mut self) -> GuardResult<Fd> {
        let file = self.file.take().ok_or(GuardError::AlreadyReleased)?;
        debug!(fd = self.raw, label = self.label(), "Descriptor handed over without close");
        Ok(file.into_raw_fd())
    }

    #[inline]
    pub fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }

    /// Whether the descriptor is still owned by this guard
    #[inline]
    pub fn is_active(&self) -> bool {
        self.file.is_some()
    }

    /// Close the descriptor
    ///
    /// Returns `AlreadyReleased` without touching the kernel on a second call.
    pub fn release(&mut self) -> GuardResult<()> {
        let file = self.file.take().ok_or(GuardError::AlreadyReleased)?;

        let raw = file.into_raw_fd();
        nix::unistd::close(raw)
            .map_err(|errno| GuardError::OperationFailed(format!("close({}): {}", raw, errno)))?;

        debug!(
            fd = self.raw,
            label = self.metadata.label,
            lifetime_micros = self.metadata.lifetime_micros(),
            "fd closed"
        );
        Ok(())
    }
}

impl std::fmt::Debug for FdGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FdGuard")
            .field("fd", &self.raw)
            .field("label", &self.metadata.label)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Drop for FdGuard {
    fn drop(&mut self) {
        if self.is_active() {
            if let Err(e) = self.release() {
                error!(fd = self.raw, label = self.metadata.label, error = %e, "fd guard drop failed");
            }
        }
    }
}

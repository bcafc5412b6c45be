/*!
 * RAII Resource Guards
 *
 * Scoped ownership of kernel resources with automatic cleanup.
 *
 * Every pipe endpoint is held by exactly one guard in exactly one process.
 * Dropping the guard (or releasing it explicitly) closes the descriptor once;
 * a second release is rejected before it reaches the kernel.
 *
 * ## Example
 *
 * ```rust,ignore
 * let (reader, writer) = nix::unistd::pipe()?;
 * let guard = FdGuard::new(reader, "pipe.read");
 * // Use the descriptor
 * // Automatically closed on drop
 * ```
 */

mod fd;

pub use fd::FdGuard;

use miette::Diagnostic;

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Errors that can occur during guard operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
pub enum GuardError {
    #[error("Resource already released")]
    #[diagnostic(
        code(guard::already_released),
        help("Each endpoint is closed exactly once; it was used after being closed.")
    )]
    AlreadyReleased,

    #[error("Operation failed: {0}")]
    #[diagnostic(code(guard::operation_failed))]
    OperationFailed(String),
}

impl From<GuardError> for std::io::Error {
    fn from(err: GuardError) -> Self {
        let kind = match err {
            GuardError::AlreadyReleased => std::io::ErrorKind::BrokenPipe,
            GuardError::OperationFailed(_) => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

/// Guard metadata for observability
#[derive(Debug, Clone)]
pub struct GuardMetadata {
    pub resource_type: &'static str,
    pub label: &'static str,
    pub creation_time: std::time::Instant,
}

impl GuardMetadata {
    #[inline]
    pub fn new(resource_type: &'static str, label: &'static str) -> Self {
        Self {
            resource_type,
            label,
            creation_time: std::time::Instant::now(),
        }
    }

    #[inline]
    pub fn lifetime_micros(&self) -> u64 {
        self.creation_time.elapsed().as_micros() as u64
    }
}

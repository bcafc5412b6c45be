/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use miette::Diagnostic;
use thiserror::Error;

pub use super::guard::GuardError;
pub use crate::console::ConsoleError;
pub use crate::ipc::framing::ProtocolError;
pub use crate::ipc::pipe::PipeError;
pub use crate::process::ProcessError;

/// Common result type for orchestration
pub type IpcResult<T> = Result<T, IpcError>;

/// Unified error type with miette diagnostics
///
/// Every variant is fatal to the running scenario.
#[derive(Error, Debug, Diagnostic)]
pub enum IpcError {
    #[error("Pipe error: {0}")]
    #[diagnostic(transparent)]
    Pipe(#[from] PipeError),

    #[error("Protocol violation: {0}")]
    #[diagnostic(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Process error: {0}")]
    #[diagnostic(transparent)]
    Process(#[from] ProcessError),

    #[error("Console error: {0}")]
    #[diagnostic(transparent)]
    Console(#[from] ConsoleError),

    #[error("Guard error: {0}")]
    #[diagnostic(transparent)]
    Guard(#[from] GuardError),

    #[error("I/O error: {0}")]
    #[diagnostic(
        code(ipc::io_error),
        help("Standard stream I/O failed. Check that stdout and stdin are still open.")
    )]
    Io(#[from] std::io::Error),
}

impl IpcError {
    /// True for malformed or oversized messages (not for I/O failures while framing)
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, IpcError::Protocol(e) if !matches!(e, ProtocolError::Io(_)))
    }
}

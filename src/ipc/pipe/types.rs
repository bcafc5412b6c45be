/*!
 * Pipe Types
 * Common types and errors for pipes
 */

use crate::core::guard::GuardError;
use miette::Diagnostic;
use nix::errno::Errno;
use thiserror::Error;

/// Pipe operation result
pub type PipeResult<T> = Result<T, PipeError>;

/// Pipe error types
#[derive(Debug, Error, Diagnostic)]
pub enum PipeError {
    #[error("Pipe allocation failed: {errno}")]
    #[diagnostic(
        code(pipe::resource_exhausted),
        help("The descriptor table is full. Close unused descriptors or raise the open-file limit.")
    )]
    ResourceExhausted { errno: Errno },

    #[error("Endpoint {label}: {source}")]
    #[diagnostic(code(pipe::endpoint))]
    Endpoint {
        label: &'static str,
        #[source]
        source: GuardError,
    },
}

impl PipeError {
    pub(crate) fn endpoint(label: &'static str) -> impl FnOnce(GuardError) -> Self {
        move |source| PipeError::Endpoint { label, source }
    }
}

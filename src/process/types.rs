/*!
 * Process Types
 * Errors, exit outcomes and handles for duplicated processes
 */

use crate::core::guard::GuardError;
use crate::core::limits::SIGNAL_STATUS_BASE;
use crate::core::types::{Pid, Role, StdStream};
use miette::Diagnostic;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, error};

/// Process operation result
///
/// # Must Use
/// Process operations can fail and must be handled to prevent descriptor leaks
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Process errors
#[derive(Error, Debug, Diagnostic)]
pub enum ProcessError {
    #[error("Failed to duplicate process for {role}: {errno}")]
    #[diagnostic(
        code(process::spawn_failure),
        help("The process table or memory limit was reached. The scenario cannot continue.")
    )]
    SpawnFailure { role: String, errno: Errno },

    #[error("execvp {program}: {errno}")]
    #[diagnostic(
        code(process::exec_failure),
        help("Check that the program is installed and reachable through PATH.")
    )]
    ExecFailure { program: String, errno: Errno },

    #[error("Failed to redirect {target}: {errno}")]
    #[diagnostic(code(process::redirect_failed))]
    RedirectFailed { target: StdStream, errno: Errno },

    #[error("Cannot open {} for {target}: {source}", path.display())]
    #[diagnostic(code(process::stage_io))]
    StageIo {
        path: PathBuf,
        target: StdStream,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid argument for {program}: {reason}")]
    #[diagnostic(code(process::invalid_argument))]
    InvalidArgument { program: String, reason: String },

    #[error("Failed to reap PID {pid}: {errno}")]
    #[diagnostic(code(process::wait_failed))]
    WaitFailed { pid: Pid, errno: Errno },

    #[error("Invalid pipeline: {0}")]
    #[diagnostic(
        code(process::invalid_pipeline),
        help("Adjacent stages must agree: a Downstream output feeds the next stage's Upstream input.")
    )]
    InvalidPipeline(String),

    #[error("Descriptor cleanup failed: {0}")]
    #[diagnostic(code(process::guard))]
    Guard(#[from] GuardError),
}

/// How a reaped process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExitOutcome {
    /// Normal exit with a status code
    Exited(i32),
    /// Killed by the given signal number
    Signaled(i32),
}

impl ExitOutcome {
    /// Shell-style status code (128 + signal for signaled processes)
    #[inline]
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            ExitOutcome::Exited(code) => *code,
            ExitOutcome::Signaled(signal) => SIGNAL_STATUS_BASE + *signal,
        }
    }

    #[inline]
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self, ExitOutcome::Exited(0))
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Exited(code) => write!(f, "exited with status {}", code),
            ExitOutcome::Signaled(signal) => write!(f, "killed by signal {}", signal),
        }
    }
}

/// A duplicated process that still has to be reaped
#[derive(Debug)]
#[must_use = "a spawned process must be reaped with wait()"]
pub struct ProcessHandle {
    pid: Pid,
    role: Role,
}

impl ProcessHandle {
    pub(crate) fn new(pid: Pid, role: Role) -> Self {
        Self { pid, role }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Block until the process terminates and reap it
    pub fn wait(self) -> ProcessResult<ExitOutcome> {
        loop {
            match waitpid(self.pid, None) {
                Ok(WaitStatus::Exited(_, code)) => {
                    debug!(pid = %self.pid, role = %self.role, code, "Process reaped");
                    return Ok(ExitOutcome::Exited(code));
                }
                Ok(WaitStatus::Signaled(_, signal, _)) => {
                    debug!(pid = %self.pid, role = %self.role, ?signal, "Process killed by signal");
                    return Ok(ExitOutcome::Signaled(signal as i32));
                }
                Ok(status) => {
                    debug!(pid = %self.pid, ?status, "Ignoring non-terminal wait status");
                }
                Err(Errno::EINTR) => {}
                Err(errno) => {
                    error!(pid = %self.pid, role = %self.role, %errno, "waitpid failed");
                    return Err(ProcessError::WaitFailed {
                        pid: self.pid,
                        errno,
                    });
                }
            }
        }
    }
}

/*!
 * Core Types
 * Common types used across the crate
 */

use std::fmt;
use std::os::unix::io::RawFd;

/// OS process ID
pub use nix::unistd::Pid;

/// File descriptor type
pub type Fd = RawFd;

/// Role a process plays in a scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Duplex Exchange: prompts for the first input, prints the final output
    Controller,
    /// Duplex Exchange: extends the first input, prompts for the second
    Worker,
    /// Linear Pipeline: one filter program in the chain
    Stage { index: usize, program: String },
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Controller => write!(f, "controller"),
            Role::Worker => write!(f, "worker"),
            Role::Stage { index, program } => write!(f, "stage {} ({})", index + 1, program),
        }
    }
}

/// Which standard stream a descriptor is redirected onto
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Stdin,
    Stdout,
}

impl StdStream {
    #[inline]
    pub const fn fd(self) -> Fd {
        match self {
            StdStream::Stdin => 0,
            StdStream::Stdout => 1,
        }
    }
}

impl fmt::Display for StdStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StdStream::Stdin => write!(f, "stdin"),
            StdStream::Stdout => write!(f, "stdout"),
        }
    }
}

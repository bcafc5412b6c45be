/*!
 * Process Duplication
 *
 * `duplicate` forks the calling process. `spawn` builds the role branching on
 * top of it: the caller hands over the endpoints it keeps and the endpoints
 * the child gets, and each side closes the other side's set before doing
 * anything else.
 */

use super::types::{ProcessError, ProcessHandle, ProcessResult};
use crate::core::limits::PANIC_STATUS;
use crate::core::types::Role;
use nix::unistd::{fork, ForkResult};
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, warn};

/// Outcome of a duplication, seen from each side
#[derive(Debug)]
pub enum Fork {
    /// Original process, holding the new process's handle
    Parent(ProcessHandle),
    /// The new process
    Child,
}

/// Duplicate the calling process
///
/// Standard streams are flushed first so buffered output is not emitted twice.
pub fn duplicate(role: Role) -> ProcessResult<Fork> {
    flush_stdio();

    // SAFETY: callers run single-threaded orchestration code; the child only
    // closes descriptors, performs blocking I/O and exits or execs.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            debug!(pid = %child, %role, "Duplicated process");
            Ok(Fork::Parent(ProcessHandle::new(child, role)))
        }
        Ok(ForkResult::Child) => Ok(Fork::Child),
        Err(errno) => {
            error!(%role, %errno, "fork failed");
            Err(ProcessError::SpawnFailure {
                role: role.to_string(),
                errno,
            })
        }
    }
}

/// Duplicate and branch by role
///
/// `ends.0` stays with the caller, `ends.1` goes to the child. The child drops
/// `ends.0`, runs `body` and terminates with the returned status; it never
/// returns into the caller's code. The parent drops `ends.1` and gets
/// `ends.0` back together with the child's handle.
pub fn spawn<K, G, F>(role: Role, ends: (K, G), body: F) -> ProcessResult<(ProcessHandle, K)>
where
    F: FnOnce(G) -> i32,
{
    let (keep, give) = ends;

    match duplicate(role)? {
        Fork::Parent(handle) => {
            drop(give);
            Ok((handle, keep))
        }
        Fork::Child => {
            drop(keep);
            let status = run_child(body, give);
            terminate(status)
        }
    }
}

/// Run a child body, turning a panic into an exit status
fn run_child<G, F>(body: F, ends: G) -> i32
where
    F: FnOnce(G) -> i32,
{
    match panic::catch_unwind(AssertUnwindSafe(move || body(ends))) {
        Ok(status) => status,
        Err(_) => {
            error!("Child body panicked");
            PANIC_STATUS
        }
    }
}

/// Flush standard streams and exit the current process
pub fn terminate(status: i32) -> ! {
    flush_stdio();
    std::process::exit(status)
}

fn flush_stdio() {
    if let Err(e) = std::io::stdout().flush() {
        warn!(error = %e, "Failed to flush stdout");
    }
    if let Err(e) = std::io::stderr().flush() {
        warn!(error = %e, "Failed to flush stderr");
    }
}

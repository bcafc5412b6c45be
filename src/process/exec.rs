/*!
 * Stream Redirection and Program Replacement
 *
 * Runs inside a freshly duplicated process, right before `execvp`.
 */

use super::types::{ProcessError, ProcessResult};
use crate::core::guard::FdGuard;
use crate::core::types::StdStream;
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::unistd::{dup2, execvp};
use std::ffi::{CString, OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use tracing::{debug, warn};

/// Move `guard`'s descriptor onto a standard stream and close the original
///
/// A descriptor that already sits on the target stream is left in place.
pub fn redirect(guard: FdGuard, target: StdStream) -> ProcessResult<()> {
    let source = guard.raw_fd();

    if source == target.fd() {
        guard.into_raw_fd()?;
        debug!(fd = source, %target, "Descriptor already on target stream");
        return Ok(());
    }

    dup2(source, target.fd()).map_err(|errno| ProcessError::RedirectFailed { target, errno })?;
    guard.close_early()?;

    debug!(from = source, %target, "Redirected descriptor");
    Ok(())
}

/// Replace the process image with `program`, searching PATH
///
/// Only returns on failure; the returned error carries the system diagnostic.
pub fn replace_image(program: &str, args: &[OsString]) -> ProcessError {
    let argv = match build_argv(program, args) {
        Ok(argv) => argv,
        Err(e) => return e,
    };

    debug!(program, ?args, "Replacing program image");
    restore_default_sigpipe();

    match execvp(argv[0].as_c_str(), argv.as_slice()) {
        Ok(never) => match never {},
        Err(errno) => ProcessError::ExecFailure {
            program: program.to_string(),
            errno,
        },
    }
}

/// The Rust runtime ignores SIGPIPE and an ignored disposition survives exec
fn restore_default_sigpipe() {
    // SAFETY: installs the default disposition, no handler code runs
    if let Err(errno) = unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) } {
        warn!(%errno, "Could not restore default SIGPIPE disposition");
    }
}

/// `argv[0]` is the program name itself; arguments are passed as raw bytes
fn build_argv(program: &str, args: &[OsString]) -> ProcessResult<Vec<CString>> {
    std::iter::once(OsStr::new(program))
        .chain(args.iter().map(OsString::as_os_str))
        .map(|value| {
            CString::new(value.as_bytes()).map_err(|_| ProcessError::InvalidArgument {
                program: program.to_string(),
                reason: format!("{:?} contains a NUL byte", value),
            })
        })
        .collect()
}

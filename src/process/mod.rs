/*!
 * Process Module
 * Duplication, role branching, redirection, program replacement and reaping
 */

pub mod exec;
pub mod spawn;
pub mod types;

// Re-export for convenience
pub use exec::{redirect, replace_image};
pub use spawn::{duplicate, spawn, terminate, Fork};
pub use types::{ExitOutcome, ProcessError, ProcessHandle, ProcessResult};

/*!
 * Core Module
 * Shared types, limits, configuration, guards and the unified error
 */

pub mod config;
pub mod errors;
pub mod guard;
pub mod limits;
pub mod types;

pub use config::Config;
pub use errors::{IpcError, IpcResult};
pub use guard::{FdGuard, GuardError, GuardResult};
pub use types::{Fd, Pid, Role, StdStream};

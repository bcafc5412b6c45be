/*!
 * System Limits and Constants
 *
 * Centralized location for message bounds, exit statuses and the fixed
 * strings of both scenarios.
 */

// =============================================================================
// MESSAGE LIMITS
// =============================================================================

/// Size of the big-endian length prefix in front of every frame
pub const FRAME_HEADER_LEN: usize = 4;

/// Default upper bound for a single frame payload (64KB)
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 64 * 1024;

/// Smallest accepted message bound
pub const MIN_MAX_MESSAGE_BYTES: usize = 64;

/// Largest accepted message bound (16MB)
pub const MAX_MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// Longest console token accepted by a prompt
pub const MAX_CONSOLE_TOKEN_BYTES: usize = 4 * 1024;

// =============================================================================
// DUPLEX EXCHANGE
// =============================================================================

/// Appended by the worker to the first input
pub const WORKER_SUFFIX: &str = "howard.edu";

/// Appended by the controller to the reassembled message
pub const CONTROLLER_SUFFIX: &str = "gobison.org";

/// Separator between the two fields of a combined message
pub const FIELD_DELIMITER: char = '|';

pub const FIRST_PROMPT: &str = "Enter first string: ";
pub const SECOND_PROMPT: &str = "Enter second string: ";

// =============================================================================
// LINEAR PIPELINE
// =============================================================================

/// Input file listed by the first pipeline stage
pub const DEFAULT_PIPELINE_SOURCE: &str = "scores";

pub const SOURCE_PROGRAM: &str = "cat";
pub const FILTER_PROGRAM: &str = "grep";
pub const SORT_PROGRAM: &str = "sort";

// =============================================================================
// EXIT STATUSES
// =============================================================================

/// Scenario-level failure (pipe, fork, protocol, console)
pub const FAILURE_STATUS: i32 = 1;

/// Program replacement failed in a stage process [LINUX-COMPAT: shell convention]
pub const EXEC_FAILURE_STATUS: i32 = 127;

/// A child body panicked instead of returning a status
pub const PANIC_STATUS: i32 = 101;

/// Largest launch report a stage sends back when its program cannot be started
pub const MAX_LAUNCH_REPORT_BYTES: usize = 4 * 1024;

/// Offset added to a signal number when a stage is killed by a signal
pub const SIGNAL_STATUS_BASE: i32 = 128;

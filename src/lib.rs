/*!
 * Pipeworks Library
 * Pipe and process orchestration primitives and the two scenarios built on them
 */

pub mod console;
pub mod core;
pub mod ipc;
pub mod monitoring;
pub mod process;
pub mod scenarios;

// Re-exports
pub use crate::core::{Config, IpcError, IpcResult};
pub use ipc::{FramedMessage, PipePair, PipeReader, PipeWriter, ProtocolError};
pub use monitoring::{init_tracing, report_failure};
pub use process::{spawn, ExitOutcome, Fork, ProcessError, ProcessHandle};
pub use scenarios::{DuplexExchange, Pipeline, PipelineReport, StageInput, StageOutput, StageSpec};

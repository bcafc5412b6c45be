/*!
 * IPC Module
 * Pipe endpoints and the framing carried over them
 */

pub mod framing;
pub mod pipe;

pub use framing::{FramedMessage, ProtocolError, ProtocolResult};
pub use pipe::{PipeError, PipePair, PipeReader, PipeResult, PipeWriter};

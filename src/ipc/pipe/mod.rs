/*!
 * Pipe Module
 * Unix pipes for streaming bytes between processes
 */

pub mod pipe;
pub mod types;

// Re-export public API
pub use pipe::{PipePair, PipeReader, PipeWriter};
pub use types::{PipeError, PipeResult};

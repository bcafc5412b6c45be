/*!
 * Scenarios
 * The two orchestrations built from the pipe and process primitives
 */

pub mod duplex;
pub mod pipeline;

pub use duplex::{DuplexExchange, DuplexOutcome};
pub use pipeline::{Pipeline, PipelineReport, StageInput, StageOutput, StageSpec, StageStatus};

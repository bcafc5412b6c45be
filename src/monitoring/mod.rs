/*!
 * Monitoring
 * Structured logging for scenario runs
 */

mod tracer;

pub use tracer::{generate_trace_id, init_tracing, report_failure};

/*!
 * Structured Tracing
 * Logging setup and failure reporting using the tracing crate
 *
 * Standard output carries scenario output, so every log line and
 * diagnostic goes to standard error.
 */

use crate::core::config::Config;
use crate::core::errors::IpcError;
use tracing::{error, info};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: config `log_filter`)
/// - PIPEWORKS_TRACE_JSON: Enable JSON output (default: false)
pub fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.trace_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .init();
        info!("Structured tracing initialized with JSON output");
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .compact(),
            )
            .init();
        info!("Structured tracing initialized");
    }
}

/// Generate a unique ID correlating the log lines of one scenario run
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Log a fatal error and render its diagnostic on stderr
pub fn report_failure(err: IpcError) {
    error!(error = %err, pid = std::process::id(), "Scenario failed");
    eprintln!("{:?}", miette::Report::new(err));
}

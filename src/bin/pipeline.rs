/*!
 * Linear Pipeline - Entry Point
 *
 * Equivalent of `cat scores | grep <search_term> | sort`.
 */

use pipeworks::core::limits::FAILURE_STATUS;
use pipeworks::{init_tracing, report_failure, Config, IpcError, Pipeline};
use std::borrow::Cow;
use std::ffi::OsString;
use std::process::ExitCode;
use tracing::{debug, info};

fn main() -> ExitCode {
    // Search terms are passed to grep as raw bytes and need not be UTF-8
    let args: Vec<OsString> = std::env::args_os().collect();
    if args.len() != 2 {
        let prog = args
            .first()
            .map(|p| p.to_string_lossy())
            .unwrap_or(Cow::Borrowed("linear-pipeline"));
        eprintln!("Usage: {} <search_term>", prog);
        return ExitCode::from(FAILURE_STATUS as u8);
    }

    let config = Config::from_env();
    init_tracing(&config);
    debug!(config = %config.to_json(), "Linear pipeline starting");

    let pipeline = match Pipeline::search(&config.pipeline_source, &args[1]) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            report_failure(IpcError::from(e));
            return ExitCode::from(FAILURE_STATUS as u8);
        }
    };

    match pipeline.run() {
        Ok(report) => {
            let code = report.exit_code();
            info!(code, "Pipeline finished");
            ExitCode::from(code.clamp(0, 255) as u8)
        }
        Err(e) => {
            report_failure(e);
            ExitCode::from(FAILURE_STATUS as u8)
        }
    }
}

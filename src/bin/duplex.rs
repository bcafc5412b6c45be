/*!
 * Duplex Exchange - Entry Point
 *
 * Controller side of the two-process pipe conversation. The worker is
 * duplicated from this process and exits on its own.
 */

use pipeworks::core::limits::FAILURE_STATUS;
use pipeworks::{init_tracing, report_failure, Config, DuplexExchange};
use std::process::ExitCode;
use tracing::debug;

fn main() -> ExitCode {
    let config = Config::from_env();
    init_tracing(&config);
    debug!(config = %config.to_json(), "Duplex exchange starting");

    match DuplexExchange::new(&config).run() {
        Ok(outcome) => {
            debug!(final_output = %outcome.final_output, "Duplex exchange complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_failure(e);
            ExitCode::from(FAILURE_STATUS as u8)
        }
    }
}

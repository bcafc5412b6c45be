/*!
 * Duplex Exchange
 *
 * A controller and one worker process build a string over two pipes:
 *
 * ```text
 * controller                         worker
 *   read input1 (console)
 *   spawn ------------------------->
 *   c2w: frame(input1), close  ---->  read c2w to end-of-stream, close
 *                                     print input1 + "howard.edu"
 *                                     read input2 (console)
 *   read w2c to end-of-stream  <----  w2c: frame(first|input2), close, exit
 *   print first + input2 + "gobison.org"
 *   reap worker
 * ```
 */

use crate::console;
use crate::core::config::Config;
use crate::core::errors::{IpcError, IpcResult};
use crate::core::limits::{
    CONTROLLER_SUFFIX, FAILURE_STATUS, FIRST_PROMPT, SECOND_PROMPT, WORKER_SUFFIX,
};
use crate::core::types::Role;
use crate::ipc::framing::{read_frame, write_frame, FramedMessage, ProtocolError};
use crate::ipc::pipe::{PipePair, PipeReader, PipeWriter};
use crate::monitoring::{generate_trace_id, report_failure};
use crate::process::spawn;
use std::io::{self, Write};
use tracing::{debug, info_span, warn};

/// Worker's transformation of the first input
pub fn first_output(input1: &str) -> String {
    format!("{}{}", input1, WORKER_SUFFIX)
}

/// Controller's reassembly of the worker's two fields
pub fn final_output(first_output: &str, input2: &str) -> String {
    format!("{}{}{}", first_output, input2, CONTROLLER_SUFFIX)
}

/// Everything the controller learned during one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplexOutcome {
    pub first_output: String,
    pub second_input: String,
    pub final_output: String,
}

/// Endpoints owned by the controller after the spawn
struct ControllerEnds {
    to_worker: PipeWriter,
    from_worker: PipeReader,
}

/// Endpoints owned by the worker after the spawn
struct WorkerEnds {
    from_controller: PipeReader,
    to_controller: PipeWriter,
}

/// Two-round exchange between a controller and a worker process
#[derive(Debug, Clone)]
pub struct DuplexExchange {
    max_message_bytes: usize,
}

impl DuplexExchange {
    pub fn new(config: &Config) -> Self {
        Self {
            max_message_bytes: config.max_message_bytes,
        }
    }

    /// Run the exchange as the controller
    ///
    /// Blocks on the console, on both pipes and on the worker's exit.
    pub fn run(&self) -> IpcResult<DuplexOutcome> {
        let span = info_span!("duplex", run_id = %generate_trace_id());
        let _enter = span.enter();

        let (c2w_reader, c2w_writer) = PipePair::new()?.into_parts();
        let (w2c_reader, w2c_writer) = PipePair::new()?.into_parts();

        let input1 = console::ask(FIRST_PROMPT)?;

        let controller_ends = ControllerEnds {
            to_worker: c2w_writer,
            from_worker: w2c_reader,
        };
        let worker_ends = WorkerEnds {
            from_controller: c2w_reader,
            to_controller: w2c_writer,
        };

        let max = self.max_message_bytes;
        let (worker, ends) = spawn(
            Role::Worker,
            (controller_ends, worker_ends),
            move |ends| worker_main(ends, max),
        )?;

        // Reap the worker even when the exchange failed
        let exchanged = self.exchange(ends, &input1);
        let status = worker.wait();

        let outcome = exchanged?;
        let status = status?;
        if !status.success() {
            warn!(%status, "Worker finished the exchange but did not exit cleanly");
        }

        let mut stdout = io::stdout();
        writeln!(stdout, "P1 Final Output: {}", outcome.final_output)?;
        stdout.flush()?;

        Ok(outcome)
    }

    fn exchange(&self, ends: ControllerEnds, input1: &str) -> IpcResult<DuplexOutcome> {
        let ControllerEnds {
            mut to_worker,
            mut from_worker,
        } = ends;

        write_frame(&mut to_worker, input1.as_bytes(), self.max_message_bytes)?;
        to_worker.close()?;

        let payload = read_frame(&mut from_worker, self.max_message_bytes)?;
        from_worker.close()?;

        let (first_output, second_input) = FramedMessage::from_bytes(&payload)?.into_parts();
        debug!(%first_output, %second_input, "Controller received combined message");

        Ok(DuplexOutcome {
            final_output: final_output(&first_output, &second_input),
            first_output,
            second_input,
        })
    }
}

/// Worker process body
fn worker_main(ends: WorkerEnds, max: usize) -> i32 {
    match run_worker(ends, max) {
        Ok(()) => 0,
        Err(e) => {
            report_failure(e);
            FAILURE_STATUS
        }
    }
}

fn run_worker(ends: WorkerEnds, max: usize) -> Result<(), IpcError> {
    let WorkerEnds {
        mut from_controller,
        mut to_controller,
    } = ends;

    let payload = read_frame(&mut from_controller, max)?;
    from_controller.close()?;

    let input1 = String::from_utf8(payload).map_err(|_| ProtocolError::NotUtf8)?;
    let first = first_output(&input1);

    let mut stdout = io::stdout();
    writeln!(stdout, "P2 Output: {}", first)?;
    stdout.flush()?;

    let input2 = console::ask(SECOND_PROMPT)?;

    let message = FramedMessage::new(first, input2)?;
    write_frame(&mut to_controller, message.to_payload().as_bytes(), max)?;
    to_controller.close()?;

    Ok(())
}

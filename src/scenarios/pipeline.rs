/*!
 * Linear Pipeline
 *
 * Runs a list of stage descriptors as a shell-style pipeline. Every stage is a
 * child of the orchestrator: all pipes are allocated first, each stage takes
 * its own endpoints out of the pending set and closes every other endpoint
 * before redirecting its standard streams and replacing its program image.
 * The orchestrator then closes its copies and reaps the stages in order.
 *
 * Each stage also gets a close-on-exec launch pipe. A successful exec closes
 * it silently; a stage that cannot start its program writes one framed report
 * there before exiting, so start failures are told apart from programs that
 * exit with status 127 themselves.
 */

use crate::core::errors::{IpcError, IpcResult};
use crate::core::guard::FdGuard;
use crate::core::limits::{
    EXEC_FAILURE_STATUS, FILTER_PROGRAM, FRAME_HEADER_LEN, MAX_LAUNCH_REPORT_BYTES,
    SORT_PROGRAM, SOURCE_PROGRAM,
};
use crate::core::types::{Role, StdStream};
use crate::ipc::framing::{decode_frame, write_frame};
use crate::ipc::pipe::{PipePair, PipeReader, PipeResult, PipeWriter};
use crate::monitoring::{generate_trace_id, report_failure};
use crate::process::{
    redirect, replace_image, spawn, ExitOutcome, ProcessError, ProcessHandle, ProcessResult,
};
use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info_span, warn};

/// Where a stage's standard input comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageInput {
    /// Keep the orchestrator's standard input
    Inherit,
    /// Read end of the pipe fed by the previous stage
    Upstream,
    /// Open a file for reading
    File(PathBuf),
}

/// Where a stage's standard output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutput {
    /// Keep the orchestrator's standard output
    Inherit,
    /// Write end of the pipe read by the next stage
    Downstream,
    /// Create (or truncate) a file for writing
    File(PathBuf),
}

/// One program in the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub program: String,
    pub args: Vec<OsString>,
    pub stdin: StageInput,
    pub stdout: StageOutput,
}

impl StageSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: StageInput::Inherit,
            stdout: StageOutput::Inherit,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn stdin(mut self, input: StageInput) -> Self {
        self.stdin = input;
        self
    }

    pub fn stdout(mut self, output: StageOutput) -> Self {
        self.stdout = output;
        self
    }
}

/// Exit record of one reaped stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageStatus {
    pub index: usize,
    pub program: String,
    pub pid: i32,
    pub outcome: ExitOutcome,
    /// Why the program could not be started, if it was not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_error: Option<String>,
}

/// Exit records of every stage, in pipeline order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub stages: Vec<StageStatus>,
}

impl PipelineReport {
    /// Stages whose program could not be started
    pub fn exec_failures(&self) -> impl Iterator<Item = &StageStatus> {
        self.stages
            .iter()
            .filter(|s| s.launch_error.is_some())
    }

    /// Status for the whole pipeline: 127 if any stage failed to start,
    /// otherwise the last stage's status
    pub fn exit_code(&self) -> i32 {
        if self.exec_failures().next().is_some() {
            return EXEC_FAILURE_STATUS;
        }
        self.stages.last().map(|s| s.outcome.code()).unwrap_or(0)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("<unserializable report: {}>", e))
    }
}

/// Validated list of stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<StageSpec>,
}

impl Pipeline {
    pub fn new(stages: Vec<StageSpec>) -> ProcessResult<Self> {
        validate(&stages)?;
        Ok(Self { stages })
    }

    /// `cat <source> | grep <term> | sort`
    pub fn search(source: impl AsRef<OsStr>, term: impl AsRef<OsStr>) -> ProcessResult<Self> {
        Self::new(vec![
            StageSpec::new(SOURCE_PROGRAM)
                .arg(source.as_ref())
                .stdout(StageOutput::Downstream),
            StageSpec::new(FILTER_PROGRAM)
                .arg(term.as_ref())
                .stdin(StageInput::Upstream)
                .stdout(StageOutput::Downstream),
            StageSpec::new(SORT_PROGRAM).stdin(StageInput::Upstream),
        ])
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Spawn every stage, wait for all of them and report their outcomes
    pub fn run(&self) -> IpcResult<PipelineReport> {
        let span = info_span!("pipeline", run_id = %generate_trace_id(), stages = self.stages.len());
        let _enter = span.enter();

        let mut pending = PendingEnds::allocate(&self.stages)?;
        let mut launches: Vec<PipeReader> = Vec::with_capacity(self.stages.len());
        let mut handles: Vec<ProcessHandle> = Vec::with_capacity(self.stages.len());

        for (index, stage) in self.stages.iter().enumerate() {
            let (launch_reader, launch_writer) = match PipePair::close_on_exec() {
                Ok(pair) => pair.into_parts(),
                Err(e) => {
                    drop(pending);
                    drop(launches);
                    reap_after_failure(handles);
                    return Err(e.into());
                }
            };
            launches.push(launch_reader);

            let ends = StageEnds {
                links: pending.take_for(index),
                launch: launch_writer,
            };
            let role = Role::Stage {
                index,
                program: stage.program.clone(),
            };

            match spawn(role, ((pending, launches), ends), |ends| stage_main(stage, ends)) {
                Ok((handle, (rest, started))) => {
                    handles.push(handle);
                    pending = rest;
                    launches = started;
                }
                Err(e) => {
                    // Every endpoint is closed by now; started stages see end-of-stream
                    reap_after_failure(handles);
                    return Err(e.into());
                }
            }
        }

        drop(pending);

        let launched = handles
            .into_iter()
            .zip(launches.into_iter().map(read_launch_report))
            .collect();
        let stages = reap_stages(&self.stages, launched)?;

        let report = PipelineReport { stages };
        for failed in report.exec_failures() {
            warn!(
                stage = failed.index + 1,
                program = %failed.program,
                reason = failed.launch_error.as_deref().unwrap_or_default(),
                "Stage could not be started"
            );
        }
        debug!(report = %report.to_json(), "Pipeline finished");

        Ok(report)
    }
}

fn validate(stages: &[StageSpec]) -> ProcessResult<()> {
    let invalid = |msg: String| Err(ProcessError::InvalidPipeline(msg));

    let (first, last) = match (stages.first(), stages.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return invalid("pipeline has no stages".to_string()),
    };

    if let Some((index, _)) = stages
        .iter()
        .enumerate()
        .find(|(_, s)| s.program.trim().is_empty())
    {
        return invalid(format!("stage {} has an empty program name", index + 1));
    }

    if first.stdin == StageInput::Upstream {
        return invalid("stage 1 reads from upstream but has no previous stage".to_string());
    }
    if last.stdout == StageOutput::Downstream {
        return invalid(format!(
            "stage {} writes downstream but has no next stage",
            stages.len()
        ));
    }

    for (index, pair) in stages.windows(2).enumerate() {
        let feeds = pair[0].stdout == StageOutput::Downstream;
        let reads = pair[1].stdin == StageInput::Upstream;
        if feeds != reads {
            return invalid(format!(
                "stage {} output and stage {} input disagree",
                index + 1,
                index + 2
            ));
        }
    }

    Ok(())
}

/// Pipe endpoints not yet handed to a stage; link `i` joins stage `i` and `i + 1`
struct PendingEnds {
    readers: Vec<Option<PipeReader>>,
    writers: Vec<Option<PipeWriter>>,
}

impl PendingEnds {
    fn allocate(stages: &[StageSpec]) -> PipeResult<Self> {
        let links = stages.len().saturating_sub(1);
        let mut readers = Vec::with_capacity(links);
        let mut writers = Vec::with_capacity(links);

        for stage in stages.iter().take(links) {
            if stage.stdout == StageOutput::Downstream {
                let (reader, writer) = PipePair::new()?.into_parts();
                readers.push(Some(reader));
                writers.push(Some(writer));
            } else {
                readers.push(None);
                writers.push(None);
            }
        }

        Ok(Self { readers, writers })
    }

    fn take_for(&mut self, index: usize) -> LinkEnds {
        let upstream = index
            .checked_sub(1)
            .and_then(|link| self.readers.get_mut(link))
            .and_then(Option::take);
        let downstream = self.writers.get_mut(index).and_then(Option::take);

        LinkEnds {
            upstream,
            downstream,
        }
    }
}

/// The data pipe endpoints one stage owns
struct LinkEnds {
    upstream: Option<PipeReader>,
    downstream: Option<PipeWriter>,
}

/// Everything a stage process owns after the spawn
struct StageEnds {
    links: LinkEnds,
    launch: PipeWriter,
}

/// Stage process body; returns only if the program could not be started
fn stage_main(stage: &StageSpec, ends: StageEnds) -> i32 {
    let StageEnds { links, mut launch } = ends;
    let err = exec_stage(stage, links);

    let mut reason = err.to_string();
    truncate_on_char_boundary(&mut reason, MAX_LAUNCH_REPORT_BYTES);
    if let Err(e) = write_frame(&mut launch, reason.as_bytes(), MAX_LAUNCH_REPORT_BYTES) {
        warn!(error = %e, "Could not send launch report");
    }

    report_failure(IpcError::from(err));
    EXEC_FAILURE_STATUS
}

fn exec_stage(stage: &StageSpec, links: LinkEnds) -> ProcessError {
    if let Err(e) = wire_stage(stage, links) {
        return e;
    }
    replace_image(&stage.program, &stage.args)
}

fn truncate_on_char_boundary(text: &mut String, max: usize) {
    if text.len() > max {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
}

/// Read a stage's launch pipe to end-of-stream
///
/// Returns `None` when the stage replaced its program image (the pipe closed
/// on exec without data).
fn read_launch_report(mut reader: PipeReader) -> Option<String> {
    let limit = (FRAME_HEADER_LEN + MAX_LAUNCH_REPORT_BYTES + 1) as u64;
    let mut buf = Vec::new();
    if let Err(e) = reader.by_ref().take(limit).read_to_end(&mut buf) {
        warn!(error = %e, "Could not read stage launch report");
        return None;
    }

    if buf.is_empty() {
        return None;
    }

    let reason = match decode_frame(&buf, MAX_LAUNCH_REPORT_BYTES) {
        Ok(payload) => String::from_utf8_lossy(payload).into_owned(),
        Err(e) => format!("unreadable launch report: {}", e),
    };
    Some(reason)
}

fn wire_stage(stage: &StageSpec, links: LinkEnds) -> ProcessResult<()> {
    let LinkEnds {
        upstream,
        downstream,
    } = links;

    match &stage.stdin {
        StageInput::Inherit => {}
        StageInput::Upstream => {
            let reader = upstream.ok_or_else(|| {
                ProcessError::InvalidPipeline(format!("{} has no upstream pipe", stage.program))
            })?;
            redirect(reader.into_guard(), StdStream::Stdin)?;
        }
        StageInput::File(path) => {
            let file = File::open(path).map_err(|source| ProcessError::StageIo {
                path: path.clone(),
                target: StdStream::Stdin,
                source,
            })?;
            redirect(FdGuard::from_file(file, "stage.stdin.file"), StdStream::Stdin)?;
        }
    }

    match &stage.stdout {
        StageOutput::Inherit => {}
        StageOutput::Downstream => {
            let writer = downstream.ok_or_else(|| {
                ProcessError::InvalidPipeline(format!("{} has no downstream pipe", stage.program))
            })?;
            redirect(writer.into_guard(), StdStream::Stdout)?;
        }
        StageOutput::File(path) => {
            let file = File::create(path).map_err(|source| ProcessError::StageIo {
                path: path.clone(),
                target: StdStream::Stdout,
                source,
            })?;
            redirect(FdGuard::from_file(file, "stage.stdout.file"), StdStream::Stdout)?;
        }
    }

    Ok(())
}

/// Reap every stage in order
///
/// A failed wait does not stop the remaining stages from being reaped; the
/// first failure is returned once all of them were waited for.
fn reap_stages(
    specs: &[StageSpec],
    launched: Vec<(ProcessHandle, Option<String>)>,
) -> ProcessResult<Vec<StageStatus>> {
    let mut stages = Vec::with_capacity(launched.len());
    let mut first_error = None;

    for (index, (spec, (handle, launch_error))) in specs.iter().zip(launched).enumerate() {
        let pid = handle.pid();
        match handle.wait() {
            Ok(outcome) => stages.push(StageStatus {
                index,
                program: spec.program.clone(),
                pid: pid.as_raw(),
                outcome,
                launch_error,
            }),
            Err(e) => {
                warn!(stage = index + 1, %pid, error = %e, "Could not reap stage");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(stages),
    }
}

/// Reap stages that were started before a later spawn failed
fn reap_after_failure(handles: Vec<ProcessHandle>) {
    for handle in handles {
        let pid = handle.pid();
        if let Err(e) = handle.wait() {
            warn!(%pid, error = %e, "Could not reap stage after spawn failure");
        }
    }
}

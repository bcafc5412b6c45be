/*!
 * Pipeline Tests
 * Stage validation, redirection and program replacement
 */

use pipeworks::core::limits::EXEC_FAILURE_STATUS;
use pipeworks::{ExitOutcome, Pipeline, ProcessError, StageInput, StageOutput, StageSpec};
use pretty_assertions::assert_eq;
use serial_test::serial;
use std::fs;

#[test]
fn test_rejects_empty_pipeline() {
    let err = Pipeline::new(Vec::new()).unwrap_err();
    assert!(matches!(err, ProcessError::InvalidPipeline(_)));
}

#[test]
fn test_rejects_upstream_on_first_stage() {
    let err = Pipeline::new(vec![StageSpec::new("sort").stdin(StageInput::Upstream)]).unwrap_err();
    assert!(matches!(err, ProcessError::InvalidPipeline(_)));
}

#[test]
fn test_rejects_downstream_on_last_stage() {
    let err = Pipeline::new(vec![
        StageSpec::new("cat").stdout(StageOutput::Downstream),
        StageSpec::new("sort")
            .stdin(StageInput::Upstream)
            .stdout(StageOutput::Downstream),
    ])
    .unwrap_err();
    assert!(matches!(err, ProcessError::InvalidPipeline(_)));
}

#[test]
fn test_rejects_disagreeing_neighbours() {
    let err = Pipeline::new(vec![
        StageSpec::new("cat").stdout(StageOutput::Downstream),
        StageSpec::new("sort"),
    ])
    .unwrap_err();
    assert!(matches!(err, ProcessError::InvalidPipeline(_)));
}

#[test]
fn test_rejects_blank_program() {
    let err = Pipeline::new(vec![StageSpec::new("  ")]).unwrap_err();
    assert!(matches!(err, ProcessError::InvalidPipeline(_)));
}

#[test]
#[serial]
fn test_cat_grep_sort_filters_and_sorts() {
    let dir = tempfile::tempdir().unwrap();
    let scores = dir.path().join("scores");
    let output = dir.path().join("out");
    fs::write(&scores, "alice 30\nbob 20\nalice 10\n").unwrap();

    let pipeline = Pipeline::new(vec![
        StageSpec::new("cat")
            .arg(&scores)
            .stdout(StageOutput::Downstream),
        StageSpec::new("grep")
            .arg("alice")
            .stdin(StageInput::Upstream)
            .stdout(StageOutput::Downstream),
        StageSpec::new("sort")
            .stdin(StageInput::Upstream)
            .stdout(StageOutput::File(output.clone())),
    ])
    .unwrap();

    let report = pipeline.run().unwrap();

    assert_eq!(report.stages.len(), 3);
    assert!(report.stages.iter().all(|s| s.outcome.success()));
    assert_eq!(report.exit_code(), 0);
    assert_eq!(fs::read_to_string(&output).unwrap(), "alice 10\nalice 30\n");
}

#[test]
#[serial]
fn test_file_input_redirection() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    fs::write(&input, "hello\n").unwrap();

    let pipeline = Pipeline::new(vec![StageSpec::new("tr")
        .arg("a-z")
        .arg("A-Z")
        .stdin(StageInput::File(input))
        .stdout(StageOutput::File(output.clone()))])
    .unwrap();

    let report = pipeline.run().unwrap();
    assert_eq!(report.exit_code(), 0);
    assert_eq!(fs::read_to_string(&output).unwrap(), "HELLO\n");
}

#[test]
#[serial]
fn test_missing_program_reports_exec_failure() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");

    let pipeline = Pipeline::new(vec![
        StageSpec::new("pipeworks-no-such-program-xyz").stdout(StageOutput::Downstream),
        StageSpec::new("cat")
            .stdin(StageInput::Upstream)
            .stdout(StageOutput::File(output.clone())),
    ])
    .unwrap();

    let report = pipeline.run().unwrap();

    assert_eq!(
        report.stages[0].outcome,
        ExitOutcome::Exited(EXEC_FAILURE_STATUS)
    );
    // The failed stage closed its write end, so cat saw end-of-stream
    assert!(report.stages[1].outcome.success());
    assert_eq!(report.exec_failures().count(), 1);
    assert!(report.stages[0]
        .launch_error
        .as_deref()
        .unwrap()
        .contains("pipeworks-no-such-program-xyz"));
    assert_eq!(report.exit_code(), EXEC_FAILURE_STATUS);
    assert_eq!(fs::read_to_string(&output).unwrap(), "");
}

#[test]
#[serial]
fn test_program_exiting_127_is_not_a_start_failure() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");

    let pipeline = Pipeline::new(vec![
        StageSpec::new("sh")
            .arg("-c")
            .arg("exit 127")
            .stdout(StageOutput::Downstream),
        StageSpec::new("cat")
            .stdin(StageInput::Upstream)
            .stdout(StageOutput::File(output)),
    ])
    .unwrap();

    let report = pipeline.run().unwrap();

    assert_eq!(
        report.stages[0].outcome,
        ExitOutcome::Exited(EXEC_FAILURE_STATUS)
    );
    assert_eq!(report.stages[0].launch_error, None);
    assert_eq!(report.exec_failures().count(), 0);
    assert_eq!(report.exit_code(), 0);
}

#[test]
#[serial]
fn test_missing_input_file_fails_before_exec() {
    let dir = tempfile::tempdir().unwrap();

    let pipeline = Pipeline::new(vec![StageSpec::new("cat")
        .stdin(StageInput::File(dir.path().join("absent")))
        .stdout(StageOutput::File(dir.path().join("out")))])
    .unwrap();

    let report = pipeline.run().unwrap();
    assert_eq!(report.exit_code(), EXEC_FAILURE_STATUS);
}

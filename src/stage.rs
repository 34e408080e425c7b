//! Idempotent execution of pipeline stages
//!
//! A stage is a named unit of work with one declared output artifact. Completion is marked
//! by a sentinel file written only after the output artifact has been verified, so a
//! partially written artifact left by an interrupted tool never masquerades as a finished
//! stage. Re-running the whole pipeline after a partial failure only redoes incomplete work.
//!

use std::process::{Command, Stdio};

use camino::{Utf8Path, Utf8PathBuf};
use log::info;

use crate::error::PipelineError;

#[derive(Debug, PartialEq, Eq)]
pub enum StageOutcome {
    Ran,
    Skipped,
}

/// Sentinel file marking verified completion of the stage owning `output`
pub fn completion_marker_path(output: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{output}.ok"))
}

/// True if the artifact exists and is non-empty
fn is_complete_artifact(path: &Utf8Path) -> bool {
    match std::fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && metadata.len() > 0,
        Err(_) => false,
    }
}

/// True only when the artifact is present, non-empty and its completion marker was written
fn is_stage_complete(output: &Utf8Path) -> bool {
    is_complete_artifact(output) && completion_marker_path(output).is_file()
}

/// Check that a required input artifact is present before a stage action starts
pub fn require_input(stage_name: &str, path: &Utf8Path) -> Result<(), PipelineError> {
    if is_complete_artifact(path) {
        Ok(())
    } else {
        Err(PipelineError::MissingInput {
            stage: stage_name.to_string(),
            path: path.to_owned(),
        })
    }
}

/// Run one stage action unless its output artifact is already verified complete
///
/// After the action completes, the output artifact must exist and be non-empty or the stage
/// fails, a tool returning success without writing its output is a contract violation. The
/// completion marker is written last.
///
pub fn run_stage<F>(
    stage_name: &str,
    output: &Utf8Path,
    action: F,
) -> Result<StageOutcome, PipelineError>
where
    F: FnOnce() -> Result<(), PipelineError>,
{
    if is_stage_complete(output) {
        info!("Stage {stage_name}: output '{output}' already complete, skipping");
        return Ok(StageOutcome::Skipped);
    }

    info!("Stage {stage_name}: starting");
    action()?;

    if !is_complete_artifact(output) {
        return Err(PipelineError::MissingArtifact {
            stage: stage_name.to_string(),
            path: output.to_owned(),
        });
    }

    let marker = completion_marker_path(output);
    std::fs::write(&marker, stage_name).map_err(|e| {
        PipelineError::stage_execution(
            stage_name,
            format!("failed to write completion marker '{marker}': {e}"),
        )
    })?;

    info!("Stage {stage_name}: complete");
    Ok(StageOutcome::Ran)
}

fn command_label(command: &Command) -> String {
    command.get_program().to_string_lossy().into_owned()
}

/// Run an external tool to completion, failing the stage on a non-zero exit status
///
/// The tool's stderr passes through to the console and is not captured.
///
pub fn run_tool(stage_name: &str, command: &mut Command) -> Result<(), PipelineError> {
    let tool = command_label(command);
    info!("Stage {stage_name}: running {tool}");

    let status = command.stdin(Stdio::null()).status().map_err(|e| {
        PipelineError::stage_execution(stage_name, format!("failed to launch {tool}: {e}"))
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(PipelineError::stage_execution(
            stage_name,
            format!("{tool} failed with {status}"),
        ))
    }
}

/// Run a producer tool with its stdout piped into a consumer tool
///
/// Both processes run concurrently and both exit statuses are checked, a failure of either
/// side fails the stage.
///
pub fn run_tool_pipe(
    stage_name: &str,
    producer: &mut Command,
    consumer: &mut Command,
) -> Result<(), PipelineError> {
    let producer_label = command_label(producer);
    let consumer_label = command_label(consumer);
    info!("Stage {stage_name}: running {producer_label} | {consumer_label}");

    let mut producer_child = producer
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| {
            PipelineError::stage_execution(
                stage_name,
                format!("failed to launch {producer_label}: {e}"),
            )
        })?;
    let producer_stdout = producer_child.stdout.take().unwrap();

    let mut consumer_child = consumer
        .stdin(Stdio::from(producer_stdout))
        .spawn()
        .map_err(|e| {
            PipelineError::stage_execution(
                stage_name,
                format!("failed to launch {consumer_label}: {e}"),
            )
        })?;

    // If the consumer dies first the producer is unblocked by the closed pipe, so waiting
    // on the producer first cannot hang
    let producer_status = producer_child.wait().map_err(|e| {
        PipelineError::stage_execution(
            stage_name,
            format!("failed to wait on {producer_label}: {e}"),
        )
    })?;
    let consumer_status = consumer_child.wait().map_err(|e| {
        PipelineError::stage_execution(
            stage_name,
            format!("failed to wait on {consumer_label}: {e}"),
        )
    })?;

    if !producer_status.success() {
        Err(PipelineError::stage_execution(
            stage_name,
            format!("{producer_label} failed with {producer_status}"),
        ))
    } else if !consumer_status.success() {
        Err(PipelineError::stage_execution(
            stage_name,
            format!("{consumer_label} failed with {consumer_status}"),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_artifact_path(dir: &tempfile::TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap()
    }

    #[test]
    fn test_run_stage_skips_completed_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = temp_artifact_path(&dir, "artifact.txt");

        let outcome = run_stage("test", &output, || {
            std::fs::write(&output, b"payload").unwrap();
            Ok(())
        })
        .unwrap();
        assert_eq!(outcome, StageOutcome::Ran);

        // The second run must not invoke the action at all
        let mut action_count = 0;
        let outcome = run_stage("test", &output, || {
            action_count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(outcome, StageOutcome::Skipped);
        assert_eq!(action_count, 0);
    }

    #[test]
    fn test_run_stage_reruns_without_completion_marker() {
        let dir = tempfile::tempdir().unwrap();
        let output = temp_artifact_path(&dir, "artifact.txt");

        // A present artifact with no completion marker could be a partial write from an
        // interrupted tool, the stage must run again
        std::fs::write(&output, b"partial").unwrap();

        let mut action_count = 0;
        let outcome = run_stage("test", &output, || {
            action_count += 1;
            std::fs::write(&output, b"payload").unwrap();
            Ok(())
        })
        .unwrap();
        assert_eq!(outcome, StageOutcome::Ran);
        assert_eq!(action_count, 1);
    }

    #[test]
    fn test_run_stage_reruns_over_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = temp_artifact_path(&dir, "artifact.txt");

        // An empty artifact never marks a completed stage, even with a stale marker present
        std::fs::write(&output, b"").unwrap();
        std::fs::write(completion_marker_path(&output), b"test").unwrap();

        let outcome = run_stage("test", &output, || {
            std::fs::write(&output, b"payload").unwrap();
            Ok(())
        })
        .unwrap();
        assert_eq!(outcome, StageOutcome::Ran);
    }

    #[test]
    fn test_run_stage_requires_output_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let output = temp_artifact_path(&dir, "artifact.txt");

        let result = run_stage("test", &output, || Ok(()));
        assert!(matches!(result, Err(PipelineError::MissingArtifact { .. })));

        // A failed stage must not leave a completion marker behind
        assert!(!completion_marker_path(&output).exists());
    }

    #[test]
    fn test_require_input() {
        let dir = tempfile::tempdir().unwrap();
        let present = temp_artifact_path(&dir, "present.txt");
        std::fs::write(&present, b"payload").unwrap();
        assert!(require_input("test", &present).is_ok());

        let absent = temp_artifact_path(&dir, "absent.txt");
        assert!(matches!(
            require_input("test", &absent),
            Err(PipelineError::MissingInput { .. })
        ));
    }

    #[test]
    fn test_run_tool_status_check() {
        assert!(run_tool("test", &mut Command::new("true")).is_ok());
        assert!(matches!(
            run_tool("test", &mut Command::new("false")),
            Err(PipelineError::StageExecution { .. })
        ));
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::api::CoordinatorApi;
use crate::log_pipeline::{LogWriter, Masker};
use bb_core::{JobId, Result, StepId};
use bb_wire::{
    PatchJobRequest, PatchStepRequest, RunnableJob, RunnableStep, RuntimeInfoRequest,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// Captures log lines; everything else is inert.
#[derive(Default)]
struct LogCapture {
    lines: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl CoordinatorApi for LogCapture {
    async fn register_runtime_info(&self, _info: RuntimeInfoRequest) -> Result<()> {
        Ok(())
    }
    async fn dequeue(&self) -> Result<Option<RunnableJob>> {
        Ok(None)
    }
    async fn update_job_status(&self, _job_id: &JobId, patch: PatchJobRequest) -> Result<i64> {
        Ok(patch.etag + 1)
    }
    async fn update_step_status(&self, _step_id: &StepId, patch: PatchStepRequest) -> Result<i64> {
        Ok(patch.etag + 1)
    }
    async fn append_log(&self, _job_id: &JobId, chunk: &str) -> Result<()> {
        self.lines.lock().push(chunk.to_string());
        Ok(())
    }
    async fn upload_artifact(
        &self,
        _job_id: &JobId,
        _group_name: &str,
        _path: &str,
        _bytes: Vec<u8>,
    ) -> Result<()> {
        Ok(())
    }
}

fn job_with_env(env: &[(&str, &str)]) -> RunnableJob {
    RunnableJob {
        job_id: JobId::generate(),
        build_id: bb_core::BuildId::generate(),
        etag: 1,
        workflow: "main".into(),
        name: "compile".into(),
        job_type: bb_core::JobType::Exec,
        image: None,
        step_execution: bb_core::StepExecution::Sequential,
        steps: Vec::new(),
        environment: env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        secret_values: Vec::new(),
        services: Vec::new(),
        artifact_definitions: Vec::new(),
        dependency_artifacts: Vec::new(),
    }
}

fn step(commands: &[&str]) -> RunnableStep {
    RunnableStep {
        id: StepId::generate(),
        etag: 1,
        name: "run".into(),
        commands: commands.iter().map(|c| c.to_string()).collect(),
        depends: Vec::new(),
    }
}

fn writer(capture: &Arc<LogCapture>, masker: Masker) -> LogWriter {
    LogWriter::new(
        Arc::clone(capture) as Arc<dyn CoordinatorApi>,
        JobId::generate(),
        masker,
    )
}

#[tokio::test]
async fn exec_runs_commands_and_captures_output() {
    let capture = Arc::new(LogCapture::default());
    let log = writer(&capture, Masker::default());
    let dir = tempfile::tempdir().unwrap();

    let job = job_with_env(&[]);
    let step = step(&["echo one", "echo two"]);
    ExecExecutor.run_step(&job, &step, dir.path(), &log).await.unwrap();

    let lines = capture.lines.lock().clone();
    assert_eq!(lines, vec!["one\n".to_string(), "two\n".to_string()]);
}

#[tokio::test]
async fn exec_applies_environment_and_workdir() {
    let capture = Arc::new(LogCapture::default());
    let log = writer(&capture, Masker::default());
    let dir = tempfile::tempdir().unwrap();

    let job = job_with_env(&[("GREETING", "hello")]);
    let step = step(&["echo $GREETING from $(pwd)"]);
    ExecExecutor.run_step(&job, &step, dir.path(), &log).await.unwrap();

    let lines = capture.lines.lock().clone();
    assert!(lines[0].starts_with("hello from "));
    let real_dir = dir.path().canonicalize().unwrap();
    assert!(lines[0].contains(&real_dir.to_string_lossy().to_string()));
}

#[tokio::test]
async fn exec_stops_at_first_failing_command() {
    let capture = Arc::new(LogCapture::default());
    let log = writer(&capture, Masker::default());
    let dir = tempfile::tempdir().unwrap();

    let job = job_with_env(&[]);
    let step = step(&["echo before", "exit 3", "echo after"]);
    let err = ExecExecutor.run_step(&job, &step, dir.path(), &log).await.unwrap_err();
    match err {
        StepFailure::ExitStatus { code, .. } => assert_eq!(code, 3),
        other => panic!("unexpected failure {other:?}"),
    }
    let lines = capture.lines.lock().clone();
    assert_eq!(lines, vec!["before\n".to_string()]);
}

#[tokio::test]
async fn exec_captures_stderr_too() {
    let capture = Arc::new(LogCapture::default());
    let log = writer(&capture, Masker::default());
    let dir = tempfile::tempdir().unwrap();

    let job = job_with_env(&[]);
    let step = step(&["echo oops >&2"]);
    ExecExecutor.run_step(&job, &step, dir.path(), &log).await.unwrap();
    let lines = capture.lines.lock().clone();
    assert_eq!(lines, vec!["oops\n".to_string()]);
}

#[tokio::test]
async fn secret_values_never_reach_the_log() {
    let capture = Arc::new(LogCapture::default());
    let log = writer(&capture, Masker::new(vec!["hunter2".into()]));
    let dir = tempfile::tempdir().unwrap();

    let job = job_with_env(&[("TOKEN", "hunter2")]);
    let step = step(&["echo leaking $TOKEN now"]);
    ExecExecutor.run_step(&job, &step, dir.path(), &log).await.unwrap();
    let lines = capture.lines.lock().clone();
    assert_eq!(lines, vec!["leaking ******** now\n".to_string()]);
}

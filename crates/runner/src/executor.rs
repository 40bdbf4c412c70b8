// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step execution backends.
//!
//! `exec` runs commands directly on the runner host; `docker` runs them
//! inside the job's image. Both stream combined output line-by-line
//! into the masked log pipeline.

use crate::log_pipeline::LogWriter;
use bb_wire::{RunnableJob, RunnableStep};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Why a step failed.
#[derive(Debug, thiserror::Error)]
pub enum StepFailure {
    #[error("command {command:?} exited with status {code}")]
    ExitStatus { command: String, code: i32 },
    #[error("command {command:?} could not run: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Executes one step of a job in a working directory.
#[async_trait::async_trait]
pub trait Executor: Send + Sync + 'static {
    async fn run_step(
        &self,
        job: &RunnableJob,
        step: &RunnableStep,
        workdir: &Path,
        log: &LogWriter,
    ) -> Result<(), StepFailure>;
}

async fn run_command(mut command: Command, display: &str, log: &LogWriter) -> Result<(), StepFailure> {
    command.stdout(Stdio::piped()).stderr(Stdio::piped()).stdin(Stdio::null());
    let mut child = command
        .spawn()
        .map_err(|source| StepFailure::Spawn { command: display.to_string(), source })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let out_task = async {
        if let Some(stdout) = stdout {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                log.append_line(&line).await;
            }
        }
    };
    let err_task = async {
        if let Some(stderr) = stderr {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                log.append_line(&line).await;
            }
        }
    };
    let (status, _, _) = tokio::join!(child.wait(), out_task, err_task);
    let status =
        status.map_err(|source| StepFailure::Spawn { command: display.to_string(), source })?;
    if status.success() {
        Ok(())
    } else {
        Err(StepFailure::ExitStatus {
            command: display.to_string(),
            code: status.code().unwrap_or(-1),
        })
    }
}

/// Runs step commands directly through the shell.
#[derive(Default)]
pub struct ExecExecutor;

#[async_trait::async_trait]
impl Executor for ExecExecutor {
    async fn run_step(
        &self,
        job: &RunnableJob,
        step: &RunnableStep,
        workdir: &Path,
        log: &LogWriter,
    ) -> Result<(), StepFailure> {
        for command_text in &step.commands {
            let mut command = Command::new("sh");
            command.arg("-c").arg(command_text).current_dir(workdir);
            for (key, value) in &job.environment {
                command.env(key, value);
            }
            run_command(command, command_text, log).await?;
        }
        Ok(())
    }
}

/// Runs step commands inside the job's container image via the docker
/// CLI. The workdir is bind-mounted as the container workspace.
pub struct DockerExecutor {
    /// Path of the docker binary.
    binary: PathBuf,
}

impl Default for DockerExecutor {
    fn default() -> Self {
        Self { binary: PathBuf::from("docker") }
    }
}

impl DockerExecutor {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }
}

const CONTAINER_WORKSPACE: &str = "/workspace";

#[async_trait::async_trait]
impl Executor for DockerExecutor {
    async fn run_step(
        &self,
        job: &RunnableJob,
        step: &RunnableStep,
        workdir: &Path,
        log: &LogWriter,
    ) -> Result<(), StepFailure> {
        let image = job.image.as_deref().unwrap_or_default();
        for command_text in &step.commands {
            let mut command = Command::new(&self.binary);
            command
                .arg("run")
                .arg("--rm")
                .arg("--workdir")
                .arg(CONTAINER_WORKSPACE)
                .arg("--volume")
                .arg(format!("{}:{CONTAINER_WORKSPACE}", workdir.display()));
            for (key, value) in &job.environment {
                command.arg("--env").arg(format!("{key}={value}"));
            }
            command.arg(image).arg("sh").arg("-c").arg(command_text);
            run_command(command, command_text, log).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution of one dequeued job.
//!
//! Two context trees: the work tree (executor, cancelled on shutdown,
//! 2-hour ceiling) and the bookkeeping tree (status updates, own
//! 5-minute deadline), so user cancellation never truncates the record
//! of what happened.

use crate::api::CoordinatorApi;
use crate::executor::Executor;
use crate::log_pipeline::{LogWriter, Masker};
use bb_core::{JobStatus, StepStatus};
use bb_wire::{PatchJobRequest, PatchStepRequest, RunnableJob};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Hard ceiling on one job's execution.
pub(crate) const JOB_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

/// Deadline for each status update after the work context is gone.
pub(crate) const BOOKKEEPING_TIMEOUT: Duration = Duration::from_secs(5 * 60);

pub(crate) struct JobTask {
    pub api: Arc<dyn CoordinatorApi>,
    pub executor: Arc<dyn Executor>,
    pub workdir: PathBuf,
    pub cancel: CancellationToken,
}

impl JobTask {
    /// Run the job to a terminal status. Always reports an outcome,
    /// even when cancelled mid-flight. Returns whether the job
    /// succeeded.
    pub async fn run(&self, mut job: RunnableJob) -> bool {
        let log = LogWriter::new(
            Arc::clone(&self.api),
            job.job_id,
            Masker::new(job.secret_values.clone()),
        );
        job.etag = match self
            .bookkeep_job(&job, job.etag, JobStatus::Running, None)
            .await
        {
            Some(etag) => etag,
            None => return false,
        };

        let work = async {
            match job.step_execution {
                bb_core::StepExecution::Sequential => self.run_steps_sequential(&job, &log).await,
                // Parallel steps honour their declared step-level
                // depends edges by running ready waves together.
                bb_core::StepExecution::Parallel => self.run_steps_parallel(&job, &log).await,
            }
        };
        let outcome = tokio::select! {
            outcome = tokio::time::timeout(JOB_TIMEOUT, work) => match outcome {
                Ok(outcome) => outcome,
                Err(_) => Err("job exceeded the 2 hour execution ceiling".to_string()),
            },
            _ = self.cancel.cancelled() => Err("canceled by shutdown".to_string()),
        };

        match outcome {
            Ok(()) => {
                if let Err(err) = self.upload_artifacts(&job).await {
                    self.bookkeep_job(&job, job.etag, JobStatus::Failed, Some(err.clone())).await;
                    tracing::warn!(job = %job.job_id, error = %err, "artifact upload failed");
                    return false;
                }
                self.bookkeep_job(&job, job.etag, JobStatus::Succeeded, None).await;
                true
            }
            Err(message) => {
                let status = if self.cancel.is_cancelled() {
                    JobStatus::Canceled
                } else {
                    JobStatus::Failed
                };
                self.bookkeep_job(&job, job.etag, status, Some(message)).await;
                false
            }
        }
    }

    async fn run_steps_sequential(&self, job: &RunnableJob, log: &LogWriter) -> Result<(), String> {
        for step in &job.steps {
            self.run_one_step(job, step, log).await?;
        }
        Ok(())
    }

    async fn run_steps_parallel(&self, job: &RunnableJob, log: &LogWriter) -> Result<(), String> {
        let mut done: Vec<String> = Vec::new();
        let mut remaining: Vec<&bb_wire::RunnableStep> = job.steps.iter().collect();
        while !remaining.is_empty() {
            let (ready, blocked): (Vec<_>, Vec<_>) = remaining
                .into_iter()
                .partition(|s| s.depends.iter().all(|d| done.contains(d)));
            if ready.is_empty() {
                return Err("step dependencies cannot be satisfied".to_string());
            }
            let wave = ready.iter().map(|step| self.run_one_step(job, step, log));
            let results: Vec<Result<(), String>> = futures_util::future::join_all(wave).await;
            for result in results {
                result?;
            }
            done.extend(ready.iter().map(|s| s.name.clone()));
            remaining = blocked;
        }
        Ok(())
    }

    async fn run_one_step(
        &self,
        job: &RunnableJob,
        step: &bb_wire::RunnableStep,
        log: &LogWriter,
    ) -> Result<(), String> {
        let etag = match self.bookkeep_step(step, step.etag, StepStatus::Running, None).await {
            Some(etag) => etag,
            None => return Err(format!("could not start step {}", step.name)),
        };
        match self.executor.run_step(job, step, &self.workdir, log).await {
            Ok(()) => {
                self.bookkeep_step(step, etag, StepStatus::Succeeded, None).await;
                Ok(())
            }
            Err(failure) => {
                let message = failure.to_string();
                log.append_line(&message).await;
                self.bookkeep_step(step, etag, StepStatus::Failed, Some(message.clone())).await;
                Err(message)
            }
        }
    }

    async fn upload_artifacts(&self, job: &RunnableJob) -> Result<(), String> {
        for def in &job.artifact_definitions {
            for pattern in &def.paths {
                let absolute = self.workdir.join(pattern);
                let matches = glob::glob(&absolute.to_string_lossy())
                    .map_err(|e| format!("bad artifact pattern {pattern:?}: {e}"))?;
                for path in matches.flatten() {
                    let relative = path
                        .strip_prefix(&self.workdir)
                        .unwrap_or(&path)
                        .to_string_lossy()
                        .to_string();
                    let bytes = tokio::fs::read(&path)
                        .await
                        .map_err(|e| format!("reading artifact {relative:?}: {e}"))?;
                    self.api
                        .upload_artifact(&job.job_id, &def.group_name, &relative, bytes)
                        .await
                        .map_err(|e| format!("uploading artifact {relative:?}: {e}"))?;
                }
            }
        }
        Ok(())
    }

    /// Status update on the bookkeeping context. Returns the new etag,
    /// or `None` when the update could not be recorded.
    async fn bookkeep_job(
        &self,
        job: &RunnableJob,
        etag: i64,
        status: JobStatus,
        error: Option<String>,
    ) -> Option<i64> {
        let patch = PatchJobRequest { etag, status, error };
        match tokio::time::timeout(
            BOOKKEEPING_TIMEOUT,
            self.api.update_job_status(&job.job_id, patch),
        )
        .await
        {
            Ok(Ok(etag)) => Some(etag),
            Ok(Err(err)) => {
                tracing::error!(job = %job.job_id, %status, error = %err, "job status update failed");
                None
            }
            Err(_) => {
                tracing::error!(job = %job.job_id, %status, "job status update timed out");
                None
            }
        }
    }

    async fn bookkeep_step(
        &self,
        step: &bb_wire::RunnableStep,
        etag: i64,
        status: StepStatus,
        error: Option<String>,
    ) -> Option<i64> {
        let patch = PatchStepRequest { etag, status, error };
        match tokio::time::timeout(
            BOOKKEEPING_TIMEOUT,
            self.api.update_step_status(&step.id, patch),
        )
        .await
        {
            Ok(Ok(etag)) => Some(etag),
            Ok(Err(err)) => {
                tracing::error!(step = %step.id, %status, error = %err, "step status update failed");
                None
            }
            Err(_) => {
                tracing::error!(step = %step.id, %status, "step status update timed out");
                None
            }
        }
    }
}

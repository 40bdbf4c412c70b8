// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! What the runner needs from the server, as a trait.
//!
//! The REST transport implements this remotely; the single-user local
//! runner implements it with direct engine calls in one process.

use bb_core::{JobId, Result, StepId};
use bb_wire::{PatchJobRequest, PatchStepRequest, RunnableJob, RuntimeInfoRequest};

#[async_trait::async_trait]
pub trait CoordinatorApi: Send + Sync + 'static {
    /// First poll of a runner's lifetime: register what it can run.
    async fn register_runtime_info(&self, info: RuntimeInfoRequest) -> Result<()>;

    /// Ask for a job. `None` means nothing eligible right now.
    async fn dequeue(&self) -> Result<Option<RunnableJob>>;

    /// ETag-guarded job transition. Returns the new etag.
    async fn update_job_status(&self, job_id: &JobId, patch: PatchJobRequest) -> Result<i64>;

    /// ETag-guarded step transition. Returns the new etag.
    async fn update_step_status(&self, step_id: &StepId, patch: PatchStepRequest) -> Result<i64>;

    /// Append an already-masked log chunk for a job.
    async fn append_log(&self, job_id: &JobId, chunk: &str) -> Result<()>;

    /// Upload one produced file into an artifact group.
    async fn upload_artifact(
        &self,
        job_id: &JobId,
        group_name: &str,
        path: &str,
        bytes: Vec<u8>,
    ) -> Result<()>;
}

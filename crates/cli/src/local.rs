// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process coordinator: the runner-facing API implemented with
//! direct engine calls plus local-disk blob storage.

use bb_core::{JobId, LogDescriptorId, ResourceName, Result, RunnerId, StepId, SystemClock};
use bb_engine::Engine;
use bb_runner::CoordinatorApi;
use bb_wire::{PatchJobRequest, PatchStepRequest, RunnableJob, RuntimeInfoRequest};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

pub struct LocalCoordinator {
    engine: Engine<SystemClock>,
    runner_id: RunnerId,
    logs_dir: PathBuf,
    artifacts_dir: PathBuf,
    /// Open log descriptor per in-flight job.
    job_logs: Mutex<HashMap<JobId, LogDescriptorId>>,
}

impl LocalCoordinator {
    pub fn new(
        engine: Engine<SystemClock>,
        runner_id: RunnerId,
        state_dir: &std::path::Path,
    ) -> Self {
        Self {
            engine,
            runner_id,
            logs_dir: state_dir.join("logs"),
            artifacts_dir: state_dir.join("artifacts"),
            job_logs: Mutex::new(HashMap::new()),
        }
    }

    pub fn log_path(&self, job_id: &JobId) -> PathBuf {
        self.logs_dir.join(format!("{job_id}.log"))
    }

    fn remember_log(&self, job_id: JobId, log_id: LogDescriptorId) {
        if let Ok(mut map) = self.job_logs.lock() {
            map.insert(job_id, log_id);
        }
    }

    fn open_log_id(&self, job_id: &JobId) -> Option<LogDescriptorId> {
        self.job_logs.lock().ok().and_then(|map| map.get(job_id).copied())
    }
}

#[async_trait::async_trait]
impl CoordinatorApi for LocalCoordinator {
    async fn register_runtime_info(&self, info: RuntimeInfoRequest) -> Result<()> {
        self.engine
            .update_runtime_info(
                &self.runner_id,
                bb_core::RuntimeInfo {
                    os: info.os,
                    arch: info.arch,
                    software_version: info.software_version,
                    supported_job_types: info.supported_job_types,
                },
            )
            .await?;
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<RunnableJob>> {
        let job = match self.engine.dequeue(&self.runner_id).await {
            Ok(job) => job,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err),
        };
        // Open this job's log under the build's root descriptor.
        let build = {
            let mut tx = self.engine.database().begin().await?;
            bb_storage::builds::read(&mut *tx, &job.build_id).await?
        };
        let log = self.engine.open_log(&build.log_descriptor_id, job.job_id.as_str()).await?;
        self.remember_log(job.job_id, log.id);
        Ok(Some(job))
    }

    async fn update_job_status(&self, job_id: &JobId, patch: PatchJobRequest) -> Result<i64> {
        let terminal = patch.status.is_terminal();
        let job = self
            .engine
            .update_job_status(job_id, patch.etag, patch.status, patch.error)
            .await?;
        if terminal {
            if let Some(log_id) = self.open_log_id(job_id) {
                self.engine.seal_log(&log_id).await?;
            }
        }
        Ok(job.etag)
    }

    async fn update_step_status(&self, step_id: &StepId, patch: PatchStepRequest) -> Result<i64> {
        let step = self
            .engine
            .update_step_status(step_id, patch.etag, patch.status, patch.error)
            .await?;
        Ok(step.etag)
    }

    async fn append_log(&self, job_id: &JobId, chunk: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.logs_dir)
            .await
            .map_err(|e| bb_core::Error::wrap(bb_core::ErrorCode::Internal, "creating log dir", e))?;
        let path = self.log_path(job_id);
        let mut existing = tokio::fs::read(&path).await.unwrap_or_default();
        existing.extend_from_slice(chunk.as_bytes());
        tokio::fs::write(&path, existing)
            .await
            .map_err(|e| bb_core::Error::wrap(bb_core::ErrorCode::Internal, "writing log", e))?;
        if let Some(log_id) = self.open_log_id(job_id) {
            self.engine.record_log_append(&log_id, chunk.len() as i64).await?;
        }
        Ok(())
    }

    async fn upload_artifact(
        &self,
        job_id: &JobId,
        group_name: &str,
        path: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let group = ResourceName::parse(group_name)
            .map_err(|e| bb_core::Error::validation(e.to_string()))?;
        let artifact = self.engine.create_artifact(job_id, None, &group, path).await?;
        let blob_path = self.artifacts_dir.join(artifact.id.as_str());
        tokio::fs::create_dir_all(&self.artifacts_dir).await.map_err(|e| {
            bb_core::Error::wrap(bb_core::ErrorCode::Internal, "creating artifact dir", e)
        })?;
        tokio::fs::write(&blob_path, &bytes).await.map_err(|e| {
            bb_core::Error::wrap(
                bb_core::ErrorCode::ArtifactUploadFailed,
                format!("writing artifact {path:?}"),
                e,
            )
        })?;
        let digest = Sha256::digest(&bytes);
        let hash: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        self.engine.seal_artifact(&artifact, "sha256", &hash, bytes.len() as i64).await?;
        Ok(())
    }
}

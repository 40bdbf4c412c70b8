// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact metadata.

use crate::engine::Engine;
use crate::events::Publish;
use bb_core::{
    Artifact, ArtifactId, Clock, Error, ErrorCode, EventType, JobId, ResourceName, Result, StepId,
};

impl<C: Clock> Engine<C> {
    /// Register an artifact a step produced. The blob goes to the
    /// object store separately; this row is created unsealed and sealed
    /// once the upload's final hash and size are known.
    pub async fn create_artifact(
        &self,
        job_id: &JobId,
        step_id: Option<StepId>,
        group_name: &ResourceName,
        path: &str,
    ) -> Result<Artifact> {
        if path.is_empty() {
            return Err(Error::validation("artifact path must not be empty"));
        }
        let now = self.now_ms();
        let mut tx = self.db.begin().await?;
        let job = bb_storage::jobs::read(&mut *tx, job_id).await?;
        let artifact = Artifact {
            id: ArtifactId::generate(),
            created_at_ms: now,
            updated_at_ms: now,
            etag: 1,
            build_id: job.build_id,
            job_id: job.id,
            step_id,
            group_name: group_name.clone(),
            path: path.to_string(),
            hash_type: String::new(),
            hash: String::new(),
            size_bytes: 0,
            sealed: false,
        };
        bb_storage::artifacts::create(&mut *tx, &artifact).await?;
        self.publish_event(
            &mut *tx,
            &job.build_id,
            Publish {
                event_type: EventType::ArtifactCreated,
                resource_id: artifact.id.as_str(),
                workflow: Some(&job.workflow),
                job_name: Some(&job.name),
                resource_name: Some(group_name),
                payload: path.to_string(),
            },
        )
        .await?;
        self.commit(tx).await?;
        Ok(artifact)
    }

    /// Record the upload outcome. A failed upload surfaces as
    /// `ArtifactUploadFailed` to the caller; the unsealed row stays for
    /// diagnosis.
    pub async fn seal_artifact(
        &self,
        artifact: &Artifact,
        hash_type: &str,
        hash: &str,
        size_bytes: i64,
    ) -> Result<Artifact> {
        if hash.is_empty() {
            return Err(Error::new(
                ErrorCode::ArtifactUploadFailed,
                format!("artifact {} upload produced no hash", artifact.id),
            ));
        }
        let now = self.now_ms();
        let mut tx = self.db.begin().await?;
        let sealed = Artifact {
            hash_type: hash_type.to_string(),
            hash: hash.to_string(),
            size_bytes,
            sealed: true,
            ..artifact.clone()
        };
        bb_storage::artifacts::seal(&mut *tx, &sealed, now).await?;
        let stored = bb_storage::artifacts::read(&mut *tx, &artifact.id).await?;
        self.commit(tx).await?;
        Ok(stored)
    }

    /// Search a job's artifacts, following the job's indirection when
    /// it was skipped on a fingerprint hit.
    pub async fn search_artifacts(
        &self,
        job_id: &JobId,
        group_name: Option<&str>,
    ) -> Result<Vec<Artifact>> {
        let mut tx = self.db.begin().await?;
        let job = bb_storage::jobs::read(&mut *tx, job_id).await?;
        let producer = job.indirect_to_job_id.unwrap_or(job.id);
        let artifacts = bb_storage::artifacts::search(&mut *tx, &producer, group_name).await?;
        Ok(artifacts)
    }
}

#[cfg(test)]
#[path = "artifacts_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dequeue: hand the oldest runnable job to an eligible runner.

use crate::engine::Engine;
use crate::events::{status_payload, Publish};
use bb_core::{
    Clock, EnvValue, Error, ErrorCode, EventType, Job, JobStatus, Result, Runner, RunnerId,
    RuntimeInfo,
};
use bb_wire::{RunnableArtifact, RunnableArtifactDef, RunnableJob, RunnableService, RunnableStep};
use indexmap::IndexMap;
use sqlx::SqliteConnection;

impl<C: Clock> Engine<C> {
    /// Select, claim, and materialise a job for the runner. One
    /// transaction: the eligibility query claims the row, the job moves
    /// to Submitted, and the runnable document is assembled from state
    /// that can no longer change under us.
    ///
    /// `NotFound` means "nothing eligible right now"; the runner
    /// sleeps its poll interval and asks again.
    pub async fn dequeue(&self, runner_id: &RunnerId) -> Result<RunnableJob> {
        let now = self.now_ms();
        let mut tx = self.db.begin().await?;
        let runner = self.read_dispatchable_runner(&mut *tx, runner_id).await?;

        let filter = bb_storage::jobs::DequeueFilter {
            legal_entity_id: runner.legal_entity_id,
            labels: runner.labels.clone(),
            supported_job_types: runner.supported_job_types.clone(),
        };
        let mut job = bb_storage::jobs::dequeue_candidate(&mut *tx, &filter, self.dialect)
            .await?
            .ok_or_else(|| Error::not_found("runnable job"))?;

        job.status = JobStatus::Submitted;
        job.timings.submitted_at_ms = Some(now);
        job.runner_id = Some(runner.id);
        bb_storage::jobs::update_status(&mut *tx, &job, now).await?;
        self.publish_event(
            &mut *tx,
            &job.build_id,
            Publish {
                event_type: EventType::JobStatusChanged,
                resource_id: job.id.as_str(),
                workflow: Some(&job.workflow),
                job_name: Some(&job.name),
                resource_name: Some(&job.name),
                payload: status_payload(JobStatus::Submitted),
            },
        )
        .await?;
        self.recompute_build_status(&mut *tx, &job.build_id).await?;

        let document = self.materialise(&mut *tx, &job).await?;
        self.commit(tx).await?;
        tracing::info!(job = %job.id, runner = %runner_id, "dequeued job");
        Ok(document)
    }

    /// Record a runner's self-reported runtime facts (first poll of its
    /// lifetime).
    pub async fn update_runtime_info(&self, runner_id: &RunnerId, info: RuntimeInfo) -> Result<Runner> {
        let now = self.now_ms();
        let mut tx = self.db.begin().await?;
        let mut runner = self.read_dispatchable_runner(&mut *tx, runner_id).await?;
        runner.apply_runtime_info(info);
        bb_storage::runners::update(&mut *tx, &runner, now).await?;
        let stored = bb_storage::runners::read(&mut *tx, runner_id).await?;
        self.commit(tx).await?;
        Ok(stored)
    }

    /// A runner that may dequeue: it exists (not soft-deleted) and is
    /// enabled. Disabled runners are indistinguishable from missing
    /// ones to their callers.
    async fn read_dispatchable_runner(
        &self,
        conn: &mut SqliteConnection,
        runner_id: &RunnerId,
    ) -> Result<Runner> {
        let runner = bb_storage::runners::read(conn, runner_id).await?;
        if !runner.enabled {
            return Err(Error::new(
                ErrorCode::RunnerDisabled,
                format!("runner {runner_id} is disabled"),
            ));
        }
        Ok(runner)
    }

    /// Build the full runnable document: steps, plaintext environment
    /// (secrets resolved and remembered for masking), services, and
    /// dependency artifacts redirected through any indirection.
    async fn materialise(&self, conn: &mut SqliteConnection, job: &Job) -> Result<RunnableJob> {
        let steps = bb_storage::steps::list_for_job(conn, &job.id).await?;
        let mut secret_values = Vec::new();
        let environment =
            self.resolve_environment(conn, job, &job.environment, &mut secret_values).await?;

        let mut services = Vec::with_capacity(job.services.len());
        for service in &job.services {
            services.push(RunnableService {
                name: service.name.clone(),
                image: service.image.clone(),
                environment: self
                    .resolve_environment(conn, job, &service.environment, &mut secret_values)
                    .await?,
            });
        }

        let mut dependency_artifacts = Vec::new();
        for dep in bb_storage::job_dependencies::list_for_job(conn, &job.id).await? {
            let target_id = match dep.target_job_id {
                Some(id) => id,
                // The dequeue query excluded deferred edges.
                None => continue,
            };
            let target = bb_storage::jobs::read(conn, &target_id).await?;
            // A skipped target's outputs live on the job it indirects to.
            let producer = match target.indirect_to_job_id {
                Some(indirect) => indirect,
                None => target.id,
            };
            let groups: Vec<Option<&str>> = if dep.artifact_groups.is_empty() {
                vec![None]
            } else {
                dep.artifact_groups.iter().map(|g| Some(g.as_str())).collect()
            };
            for group in groups {
                for artifact in bb_storage::artifacts::search(conn, &producer, group).await? {
                    dependency_artifacts.push(RunnableArtifact {
                        group_name: artifact.group_name.as_str().to_string(),
                        path: artifact.path.clone(),
                        uri: format!("artifact://{}", artifact.id),
                        hash_type: artifact.hash_type,
                        hash: artifact.hash,
                    });
                }
            }
        }

        Ok(RunnableJob {
            job_id: job.id,
            build_id: job.build_id,
            etag: job.etag + 1,
            workflow: job.workflow.as_str().to_string(),
            name: job.name.as_str().to_string(),
            job_type: job.job_type,
            image: job.image.clone(),
            step_execution: job.step_execution,
            steps: steps
                .into_iter()
                .map(|s| RunnableStep {
                    id: s.id,
                    etag: s.etag,
                    name: s.name.as_str().to_string(),
                    commands: s.commands,
                    depends: s.depends.iter().map(|d| d.as_str().to_string()).collect(),
                })
                .collect(),
            environment,
            secret_values,
            services,
            artifact_definitions: job
                .artifact_definitions
                .iter()
                .map(|def| RunnableArtifactDef {
                    group_name: def.group_name.as_str().to_string(),
                    paths: def.paths.clone(),
                })
                .collect(),
            dependency_artifacts,
        })
    }

    async fn resolve_environment(
        &self,
        conn: &mut SqliteConnection,
        job: &Job,
        environment: &IndexMap<String, EnvValue>,
        secret_values: &mut Vec<String>,
    ) -> Result<IndexMap<String, String>> {
        let mut resolved = IndexMap::with_capacity(environment.len());
        for (key, value) in environment {
            let text = match value {
                EnvValue::Literal(text) => text.clone(),
                EnvValue::Secret(name) => {
                    let plaintext = self.resolve_secret(conn, &job.repo_id, &name).await?;
                    if !secret_values.contains(&plaintext) {
                        secret_values.push(plaintext.clone());
                    }
                    plaintext
                }
            };
            resolved.insert(key.clone(), text);
        }
        Ok(resolved)
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;

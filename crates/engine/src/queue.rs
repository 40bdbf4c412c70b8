// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Enqueue: definition → persisted build graph.
//!
//! One transaction per submission. Any failure aborts the whole
//! enqueue; a partial build is never visible.

use crate::engine::{Engine, EnqueueRequest};
use crate::events::{status_payload, Publish};
use crate::fingerprint::fingerprint_for;
use bb_core::{
    Build, BuildId, BuildStatus, Clock, Error, ErrorCode, EventType, Job, JobDefinition,
    JobDependency, JobDependencyId, JobId, JobStatus, LogDescriptor, LogDescriptorId, Ownership,
    OwnershipId, Repo, Result, Step, StepId, StepStatus, Timings,
};
use sqlx::SqliteConnection;
use std::collections::HashMap;

impl<C: Clock> Engine<C> {
    /// Enqueue a build: allocate its name from the repo counter,
    /// fingerprint and insert every job and step, resolve dependencies
    /// (deferring unresolved cross-workflow targets), and emit the
    /// submitted event.
    pub async fn enqueue(&self, request: EnqueueRequest) -> Result<Build> {
        request.definition.validate()?;
        bb_core::validate::commit_sha(&request.commit_sha)?;
        bb_core::validate::git_ref(&request.ref_name)?;
        let jobs = self.select_jobs(&request)?;
        check_cycles(&jobs)?;

        let now = self.now_ms();
        let mut tx = self.db.begin().await?;
        let repo = bb_storage::repos::read(&mut *tx, &request.repo_id).await?;

        // Double submission of a still-running build is a caller bug;
        // re-running a settled commit is normal (fingerprints make it
        // cheap).
        if !request.opts.force
            && bb_storage::builds::exists_for_commit(
                &mut *tx,
                &repo.id,
                &request.commit_sha,
                &request.ref_name,
            )
            .await?
        {
            let open = bb_storage::builds::list_for_repo(&mut *tx, &repo.id, None, 500).await?;
            let in_flight = open.items.iter().any(|b| {
                !b.is_terminal()
                    && b.commit_sha == request.commit_sha
                    && b.ref_name == request.ref_name
            });
            if in_flight {
                return Err(Error::already_exists(format!(
                    "build for {} at {}",
                    request.ref_name, request.commit_sha
                )));
            }
        }

        let number = bb_storage::repos::allocate_build_number(&mut *tx, &repo.id, now).await?;
        let build = self.insert_build(&mut *tx, &repo, number, &request, now).await?;

        // First pass: create all jobs (so same-enqueue forward
        // references resolve), second pass: dependency edges.
        let mut created: Vec<(Job, &JobDefinition)> = Vec::with_capacity(jobs.len());
        for (index, definition) in jobs.iter().enumerate() {
            let job = self
                .insert_job(&mut *tx, &repo, &build, definition, request.opts.force, now + index as i64)
                .await?;
            created.push((job, definition));
        }
        for (job, definition) in &created {
            self.insert_dependencies(&mut *tx, &build.id, job, definition).await?;
        }
        for (job, _) in &created {
            bb_storage::job_dependencies::update_deferred(
                &mut *tx,
                &build.id,
                &job.workflow,
                &job.name,
                &job.id,
            )
            .await?;
        }

        self.publish_event(
            &mut *tx,
            &build.id,
            Publish {
                event_type: EventType::BuildStatusChanged,
                resource_id: build.id.as_str(),
                workflow: None,
                job_name: None,
                resource_name: None,
                payload: status_payload(BuildStatus::Submitted),
            },
        )
        .await?;

        // All-skipped graphs settle immediately.
        let build = self.recompute_build_status(&mut *tx, &build.id).await?;
        self.commit(tx).await?;
        tracing::info!(build = %build.id, name = %build.name, jobs = created.len(), "enqueued build");
        Ok(build)
    }

    /// Add jobs to a running build (dynamic builds). Same per-job path
    /// as enqueue, in its own transaction against the existing build.
    pub async fn add_jobs(
        &self,
        build_id: &BuildId,
        definitions: Vec<JobDefinition>,
    ) -> Result<Vec<Job>> {
        if definitions.is_empty() {
            return Err(Error::validation("no jobs to add"));
        }
        let now = self.now_ms();
        let mut tx = self.db.begin().await?;
        let build = bb_storage::builds::read(&mut *tx, build_id).await?;
        if build.is_terminal() {
            return Err(Error::validation(format!(
                "build {build_id} is {} and cannot accept jobs",
                build.status
            )));
        }
        let repo = bb_storage::repos::read(&mut *tx, &build.repo_id).await?;

        // Cycle check over the combined graph: existing jobs plus the
        // additions.
        let existing = bb_storage::jobs::list_for_build(&mut *tx, build_id).await?;
        let mut graph: HashMap<String, Vec<String>> = HashMap::new();
        for job in &existing {
            let deps = bb_storage::job_dependencies::list_for_job(&mut *tx, &job.id).await?;
            graph.insert(
                job.node_key(),
                deps.iter()
                    .map(|d| format!("{}.{}", d.target_workflow, d.target_job_name))
                    .collect(),
            );
        }
        for definition in &definitions {
            graph.insert(definition.node_key(), dep_keys(definition));
        }
        bb_core::graph::check_acyclic(&graph)?;

        let mut created = Vec::with_capacity(definitions.len());
        for (index, definition) in definitions.iter().enumerate() {
            let job = self
                .insert_job(&mut *tx, &repo, &build, definition, build.opts.force, now + index as i64)
                .await?;
            created.push(job);
        }
        for (job, definition) in created.iter().zip(&definitions) {
            self.insert_dependencies(&mut *tx, build_id, job, definition).await?;
        }
        for job in &created {
            bb_storage::job_dependencies::update_deferred(
                &mut *tx,
                build_id,
                &job.workflow,
                &job.name,
                &job.id,
            )
            .await?;
        }
        self.recompute_build_status(&mut *tx, build_id).await?;
        self.commit(tx).await?;
        tracing::info!(build = %build_id, jobs = created.len(), "added dynamic jobs");
        Ok(created)
    }

    /// Narrow the definition to `nodes_to_run` plus transitive
    /// dependencies, keeping definition order.
    fn select_jobs<'d>(&self, request: &'d EnqueueRequest) -> Result<Vec<&'d JobDefinition>> {
        let all = &request.definition.jobs;
        if request.opts.nodes_to_run.is_empty() {
            return Ok(all.iter().collect());
        }
        let graph: HashMap<String, Vec<String>> =
            all.iter().map(|j| (j.node_key(), dep_keys(j))).collect();
        let wanted = bb_core::graph::reachable_from(&graph, &request.opts.nodes_to_run)?;
        Ok(all.iter().filter(|j| wanted.contains(&j.node_key())).collect())
    }

    async fn insert_build(
        &self,
        conn: &mut SqliteConnection,
        repo: &Repo,
        number: i64,
        request: &EnqueueRequest,
        now: i64,
    ) -> Result<Build> {
        let log = LogDescriptor {
            id: LogDescriptorId::generate(),
            created_at_ms: now,
            updated_at_ms: now,
            etag: 1,
            parent_id: None,
            resource_id: String::new(),
            sealed: false,
            size_bytes: 0,
        };
        let build = Build {
            id: BuildId::generate(),
            created_at_ms: now,
            updated_at_ms: now,
            etag: 1,
            repo_id: repo.id,
            name: number.to_string(),
            ref_name: request.ref_name.clone(),
            commit_sha: request.commit_sha.clone(),
            status: BuildStatus::Submitted,
            timings: Timings {
                queued_at_ms: Some(now),
                submitted_at_ms: Some(now),
                ..Timings::default()
            },
            opts: request.opts.clone(),
            log_descriptor_id: log.id,
            error: None,
        };
        let log = LogDescriptor { resource_id: build.id.as_str().to_string(), ..log };
        bb_storage::logs::create(conn, &log).await?;
        bb_storage::builds::create(conn, &build).await?;
        bb_storage::ownerships::create(
            conn,
            &Ownership {
                id: OwnershipId::generate(),
                created_at_ms: now,
                updated_at_ms: now,
                etag: 1,
                owner_resource_id: repo.id.as_str().to_string(),
                owned_resource_id: build.id.as_str().to_string(),
            },
        )
        .await?;
        let entity = bb_storage::legal_entities::read(conn, &repo.legal_entity_id).await?;
        bb_storage::resource_links::upsert(
            conn,
            &format!("{}/{}/builds/{}", entity.name, repo.name, build.name),
            build.id.as_str(),
            now,
        )
        .await?;
        Ok(build)
    }

    /// Create one job and its steps, applying fingerprint indirection.
    async fn insert_job(
        &self,
        conn: &mut SqliteConnection,
        repo: &Repo,
        build: &Build,
        definition: &JobDefinition,
        force: bool,
        now: i64,
    ) -> Result<Job> {
        let fingerprint = fingerprint_for(definition);
        let reuse = if force {
            None
        } else {
            bb_storage::jobs::find_fingerprint_target(
                conn,
                &repo.id,
                &definition.workflow,
                &definition.name,
                &fingerprint,
            )
            .await?
        };

        let (status, indirect_to, timings) = match &reuse {
            Some(target) => (
                JobStatus::Skipped,
                Some(target.id),
                Timings {
                    queued_at_ms: Some(now),
                    finished_at_ms: Some(now),
                    ..Timings::default()
                },
            ),
            None => (
                JobStatus::Queued,
                None,
                Timings { queued_at_ms: Some(now), ..Timings::default() },
            ),
        };

        let job = Job {
            id: JobId::generate(),
            created_at_ms: now,
            updated_at_ms: now,
            etag: 1,
            build_id: build.id,
            repo_id: repo.id,
            workflow: definition.workflow.clone(),
            name: definition.name.clone(),
            status,
            timings,
            job_type: definition.job_type,
            image: definition.image.clone(),
            runs_on: definition.runs_on.clone(),
            environment: definition.environment.clone(),
            services: definition.services.clone(),
            artifact_definitions: definition.artifacts.clone(),
            step_execution: definition.step_execution,
            fingerprint_commands: definition.fingerprint_commands.clone(),
            fingerprint: Some(fingerprint),
            indirect_to_job_id: indirect_to,
            runner_id: None,
            error: None,
        };
        bb_storage::jobs::create(conn, &job).await?;

        let step_status =
            if job.status == JobStatus::Skipped { StepStatus::Skipped } else { StepStatus::Queued };
        for definition in &definition.steps {
            let step = Step {
                id: StepId::generate(),
                created_at_ms: now,
                updated_at_ms: now,
                etag: 1,
                job_id: job.id,
                name: definition.name.clone(),
                status: step_status,
                timings: Timings { queued_at_ms: Some(now), ..Timings::default() },
                commands: definition.commands.clone(),
                depends: definition.depends.clone(),
                log_descriptor_id: None,
                error: None,
            };
            bb_storage::steps::create(conn, &step).await?;
        }

        bb_storage::ownerships::create(
            conn,
            &Ownership {
                id: OwnershipId::generate(),
                created_at_ms: now,
                updated_at_ms: now,
                etag: 1,
                owner_resource_id: build.id.as_str().to_string(),
                owned_resource_id: job.id.as_str().to_string(),
            },
        )
        .await?;

        if job.status == JobStatus::Skipped {
            tracing::debug!(job = %job.id, target = ?job.indirect_to_job_id, "fingerprint hit, job skipped");
            self.publish_event(
                conn,
                &build.id,
                Publish {
                    event_type: EventType::JobStatusChanged,
                    resource_id: job.id.as_str(),
                    workflow: Some(&job.workflow),
                    job_name: Some(&job.name),
                    resource_name: Some(&job.name),
                    payload: status_payload(JobStatus::Skipped),
                },
            )
            .await?;
        }
        Ok(job)
    }

    /// Insert this job's dependency edges. Same-build targets resolve
    /// immediately; cross-workflow targets that do not exist yet are
    /// stored deferred.
    async fn insert_dependencies(
        &self,
        conn: &mut SqliteConnection,
        build_id: &BuildId,
        job: &Job,
        definition: &JobDefinition,
    ) -> Result<()> {
        for dep in &definition.depends {
            let target_workflow = dep.workflow.clone().unwrap_or_else(|| job.workflow.clone());
            let target = bb_storage::jobs::read_by_name(
                conn,
                build_id,
                &target_workflow,
                &dep.job_name,
            )
            .await;
            let target_job_id = match target {
                Ok(target_job) => Some(target_job.id),
                // A same-workflow target must exist; only cross-workflow
                // targets may be deferred.
                Err(e) if e.is_not_found() => {
                    if target_workflow == job.workflow {
                        return Err(Error::new(
                            ErrorCode::ValidationFailed,
                            format!(
                                "job {} depends on unknown job {}.{}",
                                job.node_key(),
                                target_workflow,
                                dep.job_name
                            ),
                        ));
                    }
                    None
                }
                Err(e) => return Err(e),
            };
            bb_storage::job_dependencies::create(
                conn,
                &JobDependency {
                    id: JobDependencyId::generate(),
                    build_id: *build_id,
                    source_job_id: job.id,
                    target_workflow,
                    target_job_name: dep.job_name.clone(),
                    target_job_id,
                    artifact_groups: dep.artifact_groups.clone(),
                },
            )
            .await?;
        }
        Ok(())
    }
}

fn dep_keys(definition: &JobDefinition) -> Vec<String> {
    definition
        .depends
        .iter()
        .map(|d| {
            let workflow = d.workflow.as_ref().unwrap_or(&definition.workflow);
            format!("{workflow}.{}", d.job_name)
        })
        .collect()
}

fn check_cycles(jobs: &[&JobDefinition]) -> Result<()> {
    let graph: HashMap<String, Vec<String>> =
        jobs.iter().map(|j| (j.node_key(), dep_keys(j))).collect();
    bb_core::graph::check_acyclic(&graph)
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

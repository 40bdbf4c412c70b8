// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status transitions and their consequences.
//!
//! A job transition is serialised by the write transaction it runs in
//! and guarded by the caller's etag. Terminal transitions cascade:
//! dependents that can never run are canceled, the build status is
//! recomputed, and a newly terminal build seals its log and queues the
//! dynamic-identity cleanup work item.

use crate::engine::Engine;
use crate::events::{status_payload, Publish};
use bb_core::{
    Build, BuildId, BuildStatus, Clock, Error, EventType, Job, JobId, JobStatus, Result, Step,
    StepId, StepStatus,
};
use sqlx::SqliteConnection;

impl<C: Clock> Engine<C> {
    /// Transition a job, enforcing the status machine and the caller's
    /// etag. Returns the stored job after the transition and cascades.
    pub async fn update_job_status(
        &self,
        job_id: &JobId,
        etag: i64,
        next: JobStatus,
        error: Option<String>,
    ) -> Result<Job> {
        let now = self.now_ms();
        let mut tx = self.db.begin().await?;
        let mut job = bb_storage::jobs::read(&mut *tx, job_id).await?;
        if job.etag != etag {
            return Err(Error::optimistic_lock_failed(format!("job {job_id}")));
        }
        if !job.status.can_transition_to(next) {
            return Err(Error::validation(format!(
                "job {job_id} cannot move {} -> {next}",
                job.status
            )));
        }
        job.status = next;
        job.error = error;
        stamp_job_timings(&mut job, next, now);
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
                payload: status_payload(next),
            },
        )
        .await?;

        if next.is_terminal() {
            if !next.satisfies_dependency() {
                self.cancel_blocked_dependents(&mut *tx, &job.build_id).await?;
            }
            self.recompute_build_status(&mut *tx, &job.build_id).await?;
        }
        let stored = bb_storage::jobs::read(&mut *tx, job_id).await?;
        self.commit(tx).await?;
        tracing::info!(job = %job_id, status = %next, "job transitioned");
        Ok(stored)
    }

    /// Transition a step, enforcing the etag. Steps do not cascade.
    pub async fn update_step_status(
        &self,
        step_id: &StepId,
        etag: i64,
        next: StepStatus,
        error: Option<String>,
    ) -> Result<Step> {
        let now = self.now_ms();
        let mut tx = self.db.begin().await?;
        let mut step = bb_storage::steps::read(&mut *tx, step_id).await?;
        if step.etag != etag {
            return Err(Error::optimistic_lock_failed(format!("step {step_id}")));
        }
        if step.status.is_terminal() {
            return Err(Error::validation(format!(
                "step {step_id} is already {}",
                step.status
            )));
        }
        step.status = next;
        step.error = error;
        stamp_step_timings(&mut step, next, now);
        bb_storage::steps::update_status(&mut *tx, &step, now).await?;
        let job = bb_storage::jobs::read(&mut *tx, &step.job_id).await?;
        self.publish_event(
            &mut *tx,
            &job.build_id,
            Publish {
                event_type: EventType::StepStatusChanged,
                resource_id: step.id.as_str(),
                workflow: Some(&job.workflow),
                job_name: Some(&job.name),
                resource_name: Some(&step.name),
                payload: status_payload(next),
            },
        )
        .await?;
        let stored = bb_storage::steps::read(&mut *tx, step_id).await?;
        self.commit(tx).await?;
        Ok(stored)
    }

    /// Cancel a build: every non-terminal job (and its queued or
    /// running steps) moves to Canceled.
    pub async fn cancel_build(&self, build_id: &BuildId) -> Result<Build> {
        let now = self.now_ms();
        let mut tx = self.db.begin().await?;
        let jobs = bb_storage::jobs::non_terminal_for_build(&mut *tx, build_id).await?;
        for job in jobs {
            self.cancel_job_in_tx(&mut *tx, job, now).await?;
        }
        let build = self.recompute_build_status(&mut *tx, build_id).await?;
        self.commit(tx).await?;
        tracing::info!(build = %build_id, "build canceled");
        Ok(build)
    }

    /// Cancel queued/submitted jobs whose resolved dependency reached a
    /// blocking terminal state. Repeats until no new cancellation
    /// unblocks another round (chains of dependents).
    pub(crate) async fn cancel_blocked_dependents(
        &self,
        conn: &mut SqliteConnection,
        build_id: &BuildId,
    ) -> Result<()> {
        let now = self.now_ms();
        loop {
            let blocked = bb_storage::jobs::blocked_by_terminal_failure(conn, build_id).await?;
            if blocked.is_empty() {
                return Ok(());
            }
            for job in blocked {
                tracing::debug!(job = %job.id, "canceling job blocked by failed dependency");
                self.cancel_job_in_tx(conn, job, now).await?;
            }
        }
    }

    async fn cancel_job_in_tx(
        &self,
        conn: &mut SqliteConnection,
        mut job: Job,
        now: i64,
    ) -> Result<()> {
        job.status = JobStatus::Canceled;
        stamp_job_timings(&mut job, JobStatus::Canceled, now);
        bb_storage::jobs::update_status(conn, &job, now).await?;
        for mut step in bb_storage::steps::list_for_job(conn, &job.id).await? {
            if !step.status.is_terminal() {
                step.status = StepStatus::Canceled;
                stamp_step_timings(&mut step, StepStatus::Canceled, now);
                bb_storage::steps::update_status(conn, &step, now).await?;
            }
        }
        self.publish_event(
            conn,
            &job.build_id,
            Publish {
                event_type: EventType::JobStatusChanged,
                resource_id: job.id.as_str(),
                workflow: Some(&job.workflow),
                job_name: Some(&job.name),
                resource_name: Some(&job.name),
                payload: status_payload(JobStatus::Canceled),
            },
        )
        .await?;
        Ok(())
    }

    /// Recompute the build's status from its jobs. Emits the change
    /// event and, on entering a terminal state, seals the build log and
    /// queues dynamic-identity cleanup.
    pub(crate) async fn recompute_build_status(
        &self,
        conn: &mut SqliteConnection,
        build_id: &BuildId,
    ) -> Result<Build> {
        let now = self.now_ms();
        let mut build = bb_storage::builds::read(conn, build_id).await?;
        let statuses = bb_storage::jobs::statuses_for_build(conn, build_id).await?;
        let next = BuildStatus::rollup(statuses);
        if next == build.status || build.is_terminal() {
            return Ok(build);
        }
        build.status = next;
        match next {
            BuildStatus::Running => build.timings.running_at_ms = Some(now),
            BuildStatus::Succeeded | BuildStatus::Failed => {
                build.timings.finished_at_ms = Some(now)
            }
            BuildStatus::Canceled => {
                build.timings.canceled_at_ms = Some(now);
                build.timings.finished_at_ms = Some(now);
            }
            BuildStatus::Queued | BuildStatus::Submitted => {}
        }
        bb_storage::builds::update_status(conn, &build, now).await?;
        self.publish_event(
            conn,
            build_id,
            Publish {
                event_type: EventType::BuildStatusChanged,
                resource_id: build_id.as_str(),
                workflow: None,
                job_name: None,
                resource_name: None,
                payload: status_payload(next),
            },
        )
        .await?;
        if next.is_terminal() {
            bb_storage::logs::seal(conn, &build.log_descriptor_id, now).await?;
            self.publish_event(
                conn,
                build_id,
                Publish {
                    event_type: EventType::LogSealed,
                    resource_id: build.log_descriptor_id.as_str(),
                    workflow: None,
                    job_name: None,
                    resource_name: None,
                    payload: String::new(),
                },
            )
            .await?;
            // Side effect, not part of the request path: delete the
            // dynamic identity through the work queue.
            bb_storage::work_items::add(
                conn,
                crate::handlers::DELETE_DYNAMIC_IDENTITY,
                &serde_json::json!({ "build_id": build_id.as_str() }).to_string(),
                Some(&format!("identity-cleanup:{build_id}")),
                now,
            )
            .await?;
            tracing::info!(build = %build_id, status = %next, "build reached terminal status");
        }
        Ok(build)
    }
}

fn stamp_job_timings(job: &mut Job, next: JobStatus, now: i64) {
    match next {
        JobStatus::Queued => job.timings.queued_at_ms = Some(now),
        JobStatus::Submitted => job.timings.submitted_at_ms = Some(now),
        JobStatus::Running => job.timings.running_at_ms = Some(now),
        JobStatus::Succeeded | JobStatus::Failed | JobStatus::Skipped => {
            job.timings.finished_at_ms = Some(now)
        }
        JobStatus::Canceled => {
            job.timings.canceled_at_ms = Some(now);
            job.timings.finished_at_ms = Some(now);
        }
    }
}

fn stamp_step_timings(step: &mut Step, next: StepStatus, now: i64) {
    match next {
        StepStatus::Queued => step.timings.queued_at_ms = Some(now),
        StepStatus::Running => step.timings.running_at_ms = Some(now),
        StepStatus::Succeeded | StepStatus::Failed | StepStatus::Skipped => {
            step.timings.finished_at_ms = Some(now)
        }
        StepStatus::Canceled => {
            step.timings.canceled_at_ms = Some(now);
            step.timings.finished_at_ms = Some(now);
        }
    }
}

#[cfg(test)]
#[path = "transitions_tests.rs"]
mod tests;

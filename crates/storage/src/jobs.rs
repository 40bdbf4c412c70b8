// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job table: CRUD, fingerprint lookup, and the dequeue query.

use crate::dialect::Dialect;
use crate::error::{etag_update_outcome, map_sqlx, StoreResult};
use crate::json;
use crate::legal_entities::parse_name;
use bb_core::{
    BuildId, Error, Job, JobFingerprint, JobId, JobStatus, JobType, LegalEntityId, RepoId,
    ResourceName, RunnerId,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

pub(crate) fn from_row(row: &SqliteRow) -> StoreResult<Job> {
    let fingerprint = match (
        row.try_get::<Option<String>, _>("fingerprint").map_err(map_sqlx)?,
        row.try_get::<Option<String>, _>("fingerprint_hash_type").map_err(map_sqlx)?,
    ) {
        (Some(value), Some(hash_type)) => Some(JobFingerprint { value, hash_type }),
        _ => None,
    };
    Ok(Job {
        id: JobId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        build_id: BuildId::from_string(row.try_get::<String, _>("build_id").map_err(map_sqlx)?),
        repo_id: RepoId::from_string(row.try_get::<String, _>("repo_id").map_err(map_sqlx)?),
        workflow: parse_name(row.try_get::<String, _>("workflow").map_err(map_sqlx)?)?,
        name: parse_name(row.try_get::<String, _>("name").map_err(map_sqlx)?)?,
        status: json::tag(
            &row.try_get::<String, _>("status").map_err(map_sqlx)?,
            JobStatus::parse,
            "job status",
        )?,
        timings: crate::rows::timings(row)?,
        job_type: json::tag(
            &row.try_get::<String, _>("job_type").map_err(map_sqlx)?,
            JobType::parse,
            "job type",
        )?,
        image: row.try_get("image").map_err(map_sqlx)?,
        runs_on: json::from_col(&row.try_get::<String, _>("runs_on").map_err(map_sqlx)?)?,
        environment: json::from_col(&row.try_get::<String, _>("environment").map_err(map_sqlx)?)?,
        services: json::from_col(&row.try_get::<String, _>("services").map_err(map_sqlx)?)?,
        artifact_definitions: json::from_col(
            &row.try_get::<String, _>("artifact_definitions").map_err(map_sqlx)?,
        )?,
        step_execution: json::from_col(
            &row.try_get::<String, _>("step_execution").map_err(map_sqlx)?,
        )?,
        fingerprint_commands: json::from_col(
            &row.try_get::<String, _>("fingerprint_commands").map_err(map_sqlx)?,
        )?,
        fingerprint,
        indirect_to_job_id: row
            .try_get::<Option<String>, _>("indirect_to_job_id")
            .map_err(map_sqlx)?
            .map(JobId::from_string),
        runner_id: row
            .try_get::<Option<String>, _>("runner_id")
            .map_err(map_sqlx)?
            .map(RunnerId::from_string),
        error: row.try_get("error").map_err(map_sqlx)?,
    })
}

pub async fn create(conn: &mut SqliteConnection, job: &Job) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO jobs \
         (id, created_at_ms, updated_at_ms, etag, build_id, repo_id, workflow, name, status, \
          queued_at_ms, submitted_at_ms, running_at_ms, finished_at_ms, canceled_at_ms, \
          job_type, image, runs_on, environment, services, artifact_definitions, \
          step_execution, fingerprint_commands, fingerprint, fingerprint_hash_type, \
          indirect_to_job_id, runner_id, error) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(job.id.as_str())
    .bind(job.created_at_ms)
    .bind(job.updated_at_ms)
    .bind(job.etag)
    .bind(job.build_id.as_str())
    .bind(job.repo_id.as_str())
    .bind(job.workflow.as_str())
    .bind(job.name.as_str())
    .bind(job.status.to_string())
    .bind(job.timings.queued_at_ms)
    .bind(job.timings.submitted_at_ms)
    .bind(job.timings.running_at_ms)
    .bind(job.timings.finished_at_ms)
    .bind(job.timings.canceled_at_ms)
    .bind(job.job_type.to_string())
    .bind(&job.image)
    .bind(json::to_col(&job.runs_on)?)
    .bind(json::to_col(&job.environment)?)
    .bind(json::to_col(&job.services)?)
    .bind(json::to_col(&job.artifact_definitions)?)
    .bind(json::to_col(&job.step_execution)?)
    .bind(json::to_col(&job.fingerprint_commands)?)
    .bind(job.fingerprint.as_ref().map(|f| f.value.clone()))
    .bind(job.fingerprint.as_ref().map(|f| f.hash_type.clone()))
    .bind(job.indirect_to_job_id.as_ref().map(|id| id.as_str().to_string()))
    .bind(job.runner_id.as_ref().map(|id| id.as_str().to_string()))
    .bind(&job.error)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

pub async fn read(conn: &mut SqliteConnection, id: &JobId) -> StoreResult<Job> {
    let row = sqlx::query("SELECT * FROM jobs WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("job {id}")))?;
    from_row(&row)
}

pub async fn read_by_name(
    conn: &mut SqliteConnection,
    build_id: &BuildId,
    workflow: &ResourceName,
    name: &ResourceName,
) -> StoreResult<Job> {
    let row = sqlx::query("SELECT * FROM jobs WHERE build_id = ? AND workflow = ? AND name = ?")
        .bind(build_id.as_str())
        .bind(workflow.as_str())
        .bind(name.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("job {workflow}.{name}")))?;
    from_row(&row)
}

pub async fn list_for_build(conn: &mut SqliteConnection, build_id: &BuildId) -> StoreResult<Vec<Job>> {
    let rows = sqlx::query("SELECT * FROM jobs WHERE build_id = ? ORDER BY created_at_ms, id")
        .bind(build_id.as_str())
        .fetch_all(conn)
        .await
        .map_err(map_sqlx)?;
    rows.iter().map(from_row).collect()
}

/// Statuses of all jobs in a build, for the rollup.
pub async fn statuses_for_build(
    conn: &mut SqliteConnection,
    build_id: &BuildId,
) -> StoreResult<Vec<JobStatus>> {
    let rows = sqlx::query("SELECT status FROM jobs WHERE build_id = ?")
        .bind(build_id.as_str())
        .fetch_all(conn)
        .await
        .map_err(map_sqlx)?;
    rows.iter()
        .map(|row| {
            json::tag(
                &row.try_get::<String, _>("status").map_err(map_sqlx)?,
                JobStatus::parse,
                "job status",
            )
        })
        .collect()
}

/// ETag-guarded status/timing/error update.
pub async fn update_status(conn: &mut SqliteConnection, job: &Job, now_ms: i64) -> StoreResult<()> {
    let result = sqlx::query(
        "UPDATE jobs SET status = ?, queued_at_ms = ?, submitted_at_ms = ?, running_at_ms = ?, \
         finished_at_ms = ?, canceled_at_ms = ?, runner_id = ?, error = ?, \
         updated_at_ms = ?, etag = etag + 1 \
         WHERE id = ? AND etag = ?",
    )
    .bind(job.status.to_string())
    .bind(job.timings.queued_at_ms)
    .bind(job.timings.submitted_at_ms)
    .bind(job.timings.running_at_ms)
    .bind(job.timings.finished_at_ms)
    .bind(job.timings.canceled_at_ms)
    .bind(job.runner_id.as_ref().map(|id| id.as_str().to_string()))
    .bind(&job.error)
    .bind(now_ms)
    .bind(job.id.as_str())
    .bind(job.etag)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx)?;
    let exists = result.rows_affected() == 0 && read(conn, &job.id).await.is_ok();
    etag_update_outcome(result.rows_affected(), exists, &format!("job {}", job.id))
}

/// The most recent succeeded, non-indirected job in the repo with the
/// same (workflow, name, fingerprint, hash type): the re-use target.
pub async fn find_fingerprint_target(
    conn: &mut SqliteConnection,
    repo_id: &RepoId,
    workflow: &ResourceName,
    name: &ResourceName,
    fingerprint: &JobFingerprint,
) -> StoreResult<Option<Job>> {
    let row = sqlx::query(
        "SELECT * FROM jobs \
         WHERE repo_id = ? AND workflow = ? AND name = ? \
           AND fingerprint = ? AND fingerprint_hash_type = ? \
           AND status = 'succeeded' AND indirect_to_job_id IS NULL \
         ORDER BY created_at_ms DESC, id DESC LIMIT 1",
    )
    .bind(repo_id.as_str())
    .bind(workflow.as_str())
    .bind(name.as_str())
    .bind(&fingerprint.value)
    .bind(&fingerprint.hash_type)
    .fetch_optional(conn)
    .await
    .map_err(map_sqlx)?;
    row.as_ref().map(from_row).transpose()
}

/// Eligibility filter for [`dequeue_candidate`].
#[derive(Debug, Clone)]
pub struct DequeueFilter {
    pub legal_entity_id: LegalEntityId,
    pub labels: Vec<String>,
    pub supported_job_types: Vec<JobType>,
}

/// Select the oldest runnable queued job for a runner, in one query:
/// owned by the runner's legal entity, every dependency resolved and
/// satisfied, job type supported, and the job's `runs_on` labels covered
/// by the runner's labels. Ties on `created_at_ms` break by smallest id.
///
/// The engine-specific lock clause claims the row until the transaction
/// ends; the caller must transition the job before committing.
pub async fn dequeue_candidate(
    conn: &mut SqliteConnection,
    filter: &DequeueFilter,
    dialect: Dialect,
) -> StoreResult<Option<Job>> {
    let types: Vec<String> = filter.supported_job_types.iter().map(|t| t.to_string()).collect();
    let sql = format!(
        "SELECT j.* FROM jobs j \
         JOIN repos r ON r.id = j.repo_id \
         WHERE j.status = 'queued' \
           AND r.legal_entity_id = ? \
           AND j.job_type IN (SELECT value FROM json_each(?)) \
           AND NOT EXISTS ( \
               SELECT 1 FROM job_dependencies d \
               LEFT JOIN jobs t ON t.id = d.target_job_id \
               WHERE d.source_job_id = j.id \
                 AND (d.target_job_id IS NULL \
                      OR t.status NOT IN ('succeeded', 'skipped'))) \
           AND NOT EXISTS ( \
               SELECT 1 FROM json_each(j.runs_on) need \
               WHERE need.value NOT IN (SELECT value FROM json_each(?))) \
         ORDER BY j.created_at_ms, j.id \
         LIMIT 1{}",
        dialect.for_update_skip_locked()
    );
    let row = sqlx::query(&sql)
        .bind(filter.legal_entity_id.as_str())
        .bind(json::to_col(&types)?)
        .bind(json::to_col(&filter.labels)?)
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?;
    row.as_ref().map(from_row).transpose()
}

/// Queued or submitted jobs of a build that depend on a resolved target
/// in a blocking terminal state: candidates for the cascade to
/// `Canceled`.
pub async fn blocked_by_terminal_failure(
    conn: &mut SqliteConnection,
    build_id: &BuildId,
) -> StoreResult<Vec<Job>> {
    let rows = sqlx::query(
        "SELECT DISTINCT j.* FROM jobs j \
         JOIN job_dependencies d ON d.source_job_id = j.id \
         JOIN jobs t ON t.id = d.target_job_id \
         WHERE j.build_id = ? \
           AND j.status IN ('queued', 'submitted') \
           AND t.status IN ('failed', 'canceled') \
         ORDER BY j.created_at_ms, j.id",
    )
    .bind(build_id.as_str())
    .fetch_all(conn)
    .await
    .map_err(map_sqlx)?;
    rows.iter().map(from_row).collect()
}

/// Non-terminal jobs of a build, oldest first. Used by build cancel.
pub async fn non_terminal_for_build(
    conn: &mut SqliteConnection,
    build_id: &BuildId,
) -> StoreResult<Vec<Job>> {
    let rows = sqlx::query(
        "SELECT * FROM jobs WHERE build_id = ? \
         AND status IN ('queued', 'submitted', 'running') \
         ORDER BY created_at_ms, id",
    )
    .bind(build_id.as_str())
    .fetch_all(conn)
    .await
    .map_err(map_sqlx)?;
    rows.iter().map(from_row).collect()
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;

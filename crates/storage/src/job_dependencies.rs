// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job dependency edges, including deferred cross-workflow edges.

use crate::error::{map_sqlx, StoreResult};
use crate::json;
use crate::legal_entities::parse_name;
use bb_core::{BuildId, JobDependency, JobDependencyId, JobId, ResourceName};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<JobDependency> {
    Ok(JobDependency {
        id: JobDependencyId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        build_id: BuildId::from_string(row.try_get::<String, _>("build_id").map_err(map_sqlx)?),
        source_job_id: JobId::from_string(
            row.try_get::<String, _>("source_job_id").map_err(map_sqlx)?,
        ),
        target_workflow: parse_name(
            row.try_get::<String, _>("target_workflow").map_err(map_sqlx)?,
        )?,
        target_job_name: parse_name(
            row.try_get::<String, _>("target_job_name").map_err(map_sqlx)?,
        )?,
        target_job_id: row
            .try_get::<Option<String>, _>("target_job_id")
            .map_err(map_sqlx)?
            .map(JobId::from_string),
        artifact_groups: json::from_col(
            &row.try_get::<String, _>("artifact_groups").map_err(map_sqlx)?,
        )?,
    })
}

pub async fn create(conn: &mut SqliteConnection, dep: &JobDependency) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO job_dependencies \
         (id, build_id, source_job_id, target_workflow, target_job_name, target_job_id, \
          artifact_groups) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(dep.id.as_str())
    .bind(dep.build_id.as_str())
    .bind(dep.source_job_id.as_str())
    .bind(dep.target_workflow.as_str())
    .bind(dep.target_job_name.as_str())
    .bind(dep.target_job_id.as_ref().map(|id| id.as_str().to_string()))
    .bind(json::to_col(&dep.artifact_groups)?)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

pub async fn list_for_job(
    conn: &mut SqliteConnection,
    source_job_id: &JobId,
) -> StoreResult<Vec<JobDependency>> {
    let rows = sqlx::query(
        "SELECT * FROM job_dependencies WHERE source_job_id = ? \
         ORDER BY target_workflow, target_job_name",
    )
    .bind(source_job_id.as_str())
    .fetch_all(conn)
    .await
    .map_err(map_sqlx)?;
    rows.iter().map(from_row).collect()
}

pub async fn list_for_build(
    conn: &mut SqliteConnection,
    build_id: &BuildId,
) -> StoreResult<Vec<JobDependency>> {
    let rows = sqlx::query("SELECT * FROM job_dependencies WHERE build_id = ?")
        .bind(build_id.as_str())
        .fetch_all(conn)
        .await
        .map_err(map_sqlx)?;
    rows.iter().map(from_row).collect()
}

/// Resolve every deferred edge in the build that names the given
/// (workflow, job name) onto the newly created job. Returns the number
/// of edges resolved.
pub async fn update_deferred(
    conn: &mut SqliteConnection,
    build_id: &BuildId,
    workflow: &ResourceName,
    job_name: &ResourceName,
    target_job_id: &JobId,
) -> StoreResult<u64> {
    let result = sqlx::query(
        "UPDATE job_dependencies SET target_job_id = ? \
         WHERE build_id = ? AND target_workflow = ? AND target_job_name = ? \
           AND target_job_id IS NULL",
    )
    .bind(target_job_id.as_str())
    .bind(build_id.as_str())
    .bind(workflow.as_str())
    .bind(job_name.as_str())
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(result.rows_affected())
}

/// Count of unresolved edges left in a build, for diagnostics.
pub async fn deferred_remaining(
    conn: &mut SqliteConnection,
    build_id: &BuildId,
) -> StoreResult<i64> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS n FROM job_dependencies \
         WHERE build_id = ? AND target_job_id IS NULL",
    )
    .bind(build_id.as_str())
    .fetch_one(conn)
    .await
    .map_err(map_sqlx)?;
    row.try_get("n").map_err(map_sqlx)
}

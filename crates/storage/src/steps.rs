// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step table.

use crate::error::{etag_update_outcome, map_sqlx, StoreResult};
use crate::json;
use crate::legal_entities::parse_name;
use bb_core::{Error, JobId, LogDescriptorId, Step, StepId, StepStatus};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<Step> {
    let depends: Vec<String> =
        json::from_col(&row.try_get::<String, _>("depends").map_err(map_sqlx)?)?;
    Ok(Step {
        id: StepId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        job_id: JobId::from_string(row.try_get::<String, _>("job_id").map_err(map_sqlx)?),
        name: parse_name(row.try_get::<String, _>("name").map_err(map_sqlx)?)?,
        status: json::tag(
            &row.try_get::<String, _>("status").map_err(map_sqlx)?,
            StepStatus::parse,
            "step status",
        )?,
        timings: crate::rows::timings(row)?,
        commands: json::from_col(&row.try_get::<String, _>("commands").map_err(map_sqlx)?)?,
        depends: depends.into_iter().map(parse_name).collect::<StoreResult<Vec<_>>>()?,
        log_descriptor_id: row
            .try_get::<Option<String>, _>("log_descriptor_id")
            .map_err(map_sqlx)?
            .map(LogDescriptorId::from_string),
        error: row.try_get("error").map_err(map_sqlx)?,
    })
}

pub async fn create(conn: &mut SqliteConnection, step: &Step) -> StoreResult<()> {
    let depends: Vec<String> = step.depends.iter().map(|d| d.as_str().to_string()).collect();
    sqlx::query(
        "INSERT INTO steps \
         (id, created_at_ms, updated_at_ms, etag, job_id, name, status, \
          queued_at_ms, submitted_at_ms, running_at_ms, finished_at_ms, canceled_at_ms, \
          commands, depends, log_descriptor_id, error) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(step.id.as_str())
    .bind(step.created_at_ms)
    .bind(step.updated_at_ms)
    .bind(step.etag)
    .bind(step.job_id.as_str())
    .bind(step.name.as_str())
    .bind(step.status.to_string())
    .bind(step.timings.queued_at_ms)
    .bind(step.timings.submitted_at_ms)
    .bind(step.timings.running_at_ms)
    .bind(step.timings.finished_at_ms)
    .bind(step.timings.canceled_at_ms)
    .bind(json::to_col(&step.commands)?)
    .bind(json::to_col(&depends)?)
    .bind(step.log_descriptor_id.as_ref().map(|id| id.as_str().to_string()))
    .bind(&step.error)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

pub async fn read(conn: &mut SqliteConnection, id: &StepId) -> StoreResult<Step> {
    let row = sqlx::query("SELECT * FROM steps WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("step {id}")))?;
    from_row(&row)
}

pub async fn list_for_job(conn: &mut SqliteConnection, job_id: &JobId) -> StoreResult<Vec<Step>> {
    let rows = sqlx::query("SELECT * FROM steps WHERE job_id = ? ORDER BY created_at_ms, id")
        .bind(job_id.as_str())
        .fetch_all(conn)
        .await
        .map_err(map_sqlx)?;
    rows.iter().map(from_row).collect()
}

/// ETag-guarded status/timing/error update.
pub async fn update_status(conn: &mut SqliteConnection, step: &Step, now_ms: i64) -> StoreResult<()> {
    let result = sqlx::query(
        "UPDATE steps SET status = ?, queued_at_ms = ?, submitted_at_ms = ?, running_at_ms = ?, \
         finished_at_ms = ?, canceled_at_ms = ?, log_descriptor_id = ?, error = ?, \
         updated_at_ms = ?, etag = etag + 1 \
         WHERE id = ? AND etag = ?",
    )
    .bind(step.status.to_string())
    .bind(step.timings.queued_at_ms)
    .bind(step.timings.submitted_at_ms)
    .bind(step.timings.running_at_ms)
    .bind(step.timings.finished_at_ms)
    .bind(step.timings.canceled_at_ms)
    .bind(step.log_descriptor_id.as_ref().map(|id| id.as_str().to_string()))
    .bind(&step.error)
    .bind(now_ms)
    .bind(step.id.as_str())
    .bind(step.etag)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx)?;
    let exists = result.rows_affected() == 0 && read(conn, &step.id).await.is_ok();
    etag_update_outcome(result.rows_affected(), exists, &format!("step {}", step.id))
}

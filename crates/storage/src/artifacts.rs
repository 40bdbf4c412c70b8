// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact metadata table.

use crate::error::{etag_update_outcome, map_sqlx, StoreResult};
use crate::legal_entities::parse_name;
use bb_core::{Artifact, ArtifactId, BuildId, Error, JobId, StepId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<Artifact> {
    Ok(Artifact {
        id: ArtifactId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        build_id: BuildId::from_string(row.try_get::<String, _>("build_id").map_err(map_sqlx)?),
        job_id: JobId::from_string(row.try_get::<String, _>("job_id").map_err(map_sqlx)?),
        step_id: row
            .try_get::<Option<String>, _>("step_id")
            .map_err(map_sqlx)?
            .map(StepId::from_string),
        group_name: parse_name(row.try_get::<String, _>("group_name").map_err(map_sqlx)?)?,
        path: row.try_get("path").map_err(map_sqlx)?,
        hash_type: row.try_get("hash_type").map_err(map_sqlx)?,
        hash: row.try_get("hash").map_err(map_sqlx)?,
        size_bytes: row.try_get("size_bytes").map_err(map_sqlx)?,
        sealed: row.try_get("sealed").map_err(map_sqlx)?,
    })
}

pub async fn create(conn: &mut SqliteConnection, artifact: &Artifact) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO artifacts \
         (id, created_at_ms, updated_at_ms, etag, build_id, job_id, step_id, group_name, \
          path, hash_type, hash, size_bytes, sealed) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(artifact.id.as_str())
    .bind(artifact.created_at_ms)
    .bind(artifact.updated_at_ms)
    .bind(artifact.etag)
    .bind(artifact.build_id.as_str())
    .bind(artifact.job_id.as_str())
    .bind(artifact.step_id.as_ref().map(|id| id.as_str().to_string()))
    .bind(artifact.group_name.as_str())
    .bind(&artifact.path)
    .bind(&artifact.hash_type)
    .bind(&artifact.hash)
    .bind(artifact.size_bytes)
    .bind(artifact.sealed)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

pub async fn read(conn: &mut SqliteConnection, id: &ArtifactId) -> StoreResult<Artifact> {
    let row = sqlx::query("SELECT * FROM artifacts WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("artifact {id}")))?;
    from_row(&row)
}

/// Search a job's artifacts, optionally narrowed to one group.
pub async fn search(
    conn: &mut SqliteConnection,
    job_id: &JobId,
    group_name: Option<&str>,
) -> StoreResult<Vec<Artifact>> {
    let rows = match group_name {
        Some(group) => {
            sqlx::query(
                "SELECT * FROM artifacts WHERE job_id = ? AND group_name = ? \
                 ORDER BY path",
            )
            .bind(job_id.as_str())
            .bind(group)
            .fetch_all(conn)
            .await
        }
        None => {
            sqlx::query("SELECT * FROM artifacts WHERE job_id = ? ORDER BY group_name, path")
                .bind(job_id.as_str())
                .fetch_all(conn)
                .await
        }
    }
    .map_err(map_sqlx)?;
    rows.iter().map(from_row).collect()
}

/// ETag-guarded seal: records the final hash and size once the blob
/// upload finished.
pub async fn seal(conn: &mut SqliteConnection, artifact: &Artifact, now_ms: i64) -> StoreResult<()> {
    let result = sqlx::query(
        "UPDATE artifacts SET hash = ?, hash_type = ?, size_bytes = ?, sealed = 1, \
         updated_at_ms = ?, etag = etag + 1 \
         WHERE id = ? AND etag = ?",
    )
    .bind(&artifact.hash)
    .bind(&artifact.hash_type)
    .bind(artifact.size_bytes)
    .bind(now_ms)
    .bind(artifact.id.as_str())
    .bind(artifact.etag)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx)?;
    let exists = result.rows_affected() == 0 && read(conn, &artifact.id).await.is_ok();
    etag_update_outcome(result.rows_affected(), exists, &format!("artifact {}", artifact.id))
}

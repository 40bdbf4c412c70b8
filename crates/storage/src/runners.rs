// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner table. Runners are soft-deleted so historical jobs keep their
//! dispatch record.

use crate::error::{etag_update_outcome, map_sqlx, StoreResult};
use crate::json;
use crate::legal_entities::parse_name;
use bb_core::{Error, LegalEntityId, ResourceName, Runner, RunnerId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<Runner> {
    Ok(Runner {
        id: RunnerId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        deleted_at_ms: row.try_get("deleted_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        legal_entity_id: LegalEntityId::from_string(
            row.try_get::<String, _>("legal_entity_id").map_err(map_sqlx)?,
        ),
        name: parse_name(row.try_get::<String, _>("name").map_err(map_sqlx)?)?,
        labels: json::from_col(&row.try_get::<String, _>("labels").map_err(map_sqlx)?)?,
        supported_job_types: json::from_col(
            &row.try_get::<String, _>("supported_job_types").map_err(map_sqlx)?,
        )?,
        os: row.try_get("os").map_err(map_sqlx)?,
        arch: row.try_get("arch").map_err(map_sqlx)?,
        software_version: row.try_get("software_version").map_err(map_sqlx)?,
        enabled: row.try_get("enabled").map_err(map_sqlx)?,
    })
}

pub async fn create(conn: &mut SqliteConnection, runner: &Runner) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO runners \
         (id, created_at_ms, updated_at_ms, deleted_at_ms, etag, legal_entity_id, name, \
          labels, supported_job_types, os, arch, software_version, enabled) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(runner.id.as_str())
    .bind(runner.created_at_ms)
    .bind(runner.updated_at_ms)
    .bind(runner.deleted_at_ms)
    .bind(runner.etag)
    .bind(runner.legal_entity_id.as_str())
    .bind(runner.name.as_str())
    .bind(json::to_col(&runner.labels)?)
    .bind(json::to_col(&runner.supported_job_types)?)
    .bind(&runner.os)
    .bind(&runner.arch)
    .bind(&runner.software_version)
    .bind(runner.enabled)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

/// Read a live (not soft-deleted) runner.
pub async fn read(conn: &mut SqliteConnection, id: &RunnerId) -> StoreResult<Runner> {
    let row = sqlx::query("SELECT * FROM runners WHERE id = ? AND deleted_at_ms IS NULL")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("runner {id}")))?;
    from_row(&row)
}

pub async fn read_by_name(
    conn: &mut SqliteConnection,
    legal_entity_id: &LegalEntityId,
    name: &ResourceName,
) -> StoreResult<Runner> {
    let row = sqlx::query(
        "SELECT * FROM runners \
         WHERE legal_entity_id = ? AND name = ? AND deleted_at_ms IS NULL",
    )
    .bind(legal_entity_id.as_str())
    .bind(name.as_str())
    .fetch_optional(conn)
    .await
    .map_err(map_sqlx)?
    .ok_or_else(|| Error::not_found(format!("runner {name}")))?;
    from_row(&row)
}

/// ETag-guarded update of the mutable runner fields.
pub async fn update(conn: &mut SqliteConnection, runner: &Runner, now_ms: i64) -> StoreResult<()> {
    let result = sqlx::query(
        "UPDATE runners SET labels = ?, supported_job_types = ?, os = ?, arch = ?, \
         software_version = ?, enabled = ?, updated_at_ms = ?, etag = etag + 1 \
         WHERE id = ? AND etag = ? AND deleted_at_ms IS NULL",
    )
    .bind(json::to_col(&runner.labels)?)
    .bind(json::to_col(&runner.supported_job_types)?)
    .bind(&runner.os)
    .bind(&runner.arch)
    .bind(&runner.software_version)
    .bind(runner.enabled)
    .bind(now_ms)
    .bind(runner.id.as_str())
    .bind(runner.etag)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx)?;
    let exists = result.rows_affected() == 0 && read(conn, &runner.id).await.is_ok();
    etag_update_outcome(result.rows_affected(), exists, &format!("runner {}", runner.id))
}

/// Soft delete. The live-name unique index frees the name for re-use.
pub async fn soft_delete(
    conn: &mut SqliteConnection,
    id: &RunnerId,
    now_ms: i64,
) -> StoreResult<()> {
    let result = sqlx::query(
        "UPDATE runners SET deleted_at_ms = ?, updated_at_ms = ?, etag = etag + 1 \
         WHERE id = ? AND deleted_at_ms IS NULL",
    )
    .bind(now_ms)
    .bind(now_ms)
    .bind(id.as_str())
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found(format!("runner {id}")));
    }
    Ok(())
}

pub async fn list_for_legal_entity(
    conn: &mut SqliteConnection,
    legal_entity_id: &LegalEntityId,
) -> StoreResult<Vec<Runner>> {
    let rows = sqlx::query(
        "SELECT * FROM runners WHERE legal_entity_id = ? AND deleted_at_ms IS NULL \
         ORDER BY created_at_ms, id",
    )
    .bind(legal_entity_id.as_str())
    .fetch_all(conn)
    .await
    .map_err(map_sqlx)?;
    rows.iter().map(from_row).collect()
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log-descriptor table.

use crate::error::{map_sqlx, StoreResult};
use bb_core::{Error, ErrorCode, LogDescriptor, LogDescriptorId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<LogDescriptor> {
    Ok(LogDescriptor {
        id: LogDescriptorId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        parent_id: row
            .try_get::<Option<String>, _>("parent_id")
            .map_err(map_sqlx)?
            .map(LogDescriptorId::from_string),
        resource_id: row.try_get("resource_id").map_err(map_sqlx)?,
        sealed: row.try_get("sealed").map_err(map_sqlx)?,
        size_bytes: row.try_get("size_bytes").map_err(map_sqlx)?,
    })
}

pub async fn create(conn: &mut SqliteConnection, log: &LogDescriptor) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO log_descriptors \
         (id, created_at_ms, updated_at_ms, etag, parent_id, resource_id, sealed, size_bytes) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(log.id.as_str())
    .bind(log.created_at_ms)
    .bind(log.updated_at_ms)
    .bind(log.etag)
    .bind(log.parent_id.as_ref().map(|id| id.as_str().to_string()))
    .bind(&log.resource_id)
    .bind(log.sealed)
    .bind(log.size_bytes)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

pub async fn read(conn: &mut SqliteConnection, id: &LogDescriptorId) -> StoreResult<LogDescriptor> {
    let row = sqlx::query("SELECT * FROM log_descriptors WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("log {id}")))?;
    from_row(&row)
}

pub async fn children(
    conn: &mut SqliteConnection,
    parent_id: &LogDescriptorId,
) -> StoreResult<Vec<LogDescriptor>> {
    let rows = sqlx::query(
        "SELECT * FROM log_descriptors WHERE parent_id = ? ORDER BY created_at_ms, id",
    )
    .bind(parent_id.as_str())
    .fetch_all(conn)
    .await
    .map_err(map_sqlx)?;
    rows.iter().map(from_row).collect()
}

/// Record appended bytes. Fails `LogClosed` once the descriptor is
/// sealed.
pub async fn record_append(
    conn: &mut SqliteConnection,
    id: &LogDescriptorId,
    appended_bytes: i64,
    now_ms: i64,
) -> StoreResult<()> {
    let result = sqlx::query(
        "UPDATE log_descriptors SET size_bytes = size_bytes + ?, updated_at_ms = ?, \
         etag = etag + 1 \
         WHERE id = ? AND sealed = 0",
    )
    .bind(appended_bytes)
    .bind(now_ms)
    .bind(id.as_str())
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx)?;
    if result.rows_affected() == 0 {
        // Distinguish a sealed log from a missing one.
        let existing = read(conn, id).await?;
        debug_assert!(existing.sealed);
        return Err(Error::new(ErrorCode::LogClosed, format!("log {id} is sealed")));
    }
    Ok(())
}

/// Seal a descriptor. Sealing twice is a no-op.
pub async fn seal(conn: &mut SqliteConnection, id: &LogDescriptorId, now_ms: i64) -> StoreResult<()> {
    sqlx::query(
        "UPDATE log_descriptors SET sealed = 1, updated_at_ms = ?, etag = etag + 1 \
         WHERE id = ? AND sealed = 0",
    )
    .bind(now_ms)
    .bind(id.as_str())
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;

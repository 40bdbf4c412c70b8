// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource links: human path ⇄ id bijection, upserted on mutation.

use crate::error::{map_sqlx, StoreResult};
use bb_core::{Error, ResourceLink, ResourceLinkId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<ResourceLink> {
    Ok(ResourceLink {
        id: ResourceLinkId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        path: row.try_get("path").map_err(map_sqlx)?,
        resource_id: row.try_get("resource_id").map_err(map_sqlx)?,
    })
}

/// Point `path` at `resource_id`, stealing the path from any previous
/// owner (renames leave no stale link behind).
pub async fn upsert(
    conn: &mut SqliteConnection,
    path: &str,
    resource_id: &str,
    now_ms: i64,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO resource_links \
         (id, created_at_ms, updated_at_ms, etag, path, resource_id) \
         VALUES (?, ?, ?, 1, ?, ?) \
         ON CONFLICT (path) DO UPDATE SET \
             resource_id = excluded.resource_id, \
             updated_at_ms = excluded.updated_at_ms, \
             etag = etag + 1",
    )
    .bind(ResourceLinkId::generate().as_str())
    .bind(now_ms)
    .bind(now_ms)
    .bind(path)
    .bind(resource_id)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

pub async fn resolve(conn: &mut SqliteConnection, path: &str) -> StoreResult<String> {
    let row = sqlx::query("SELECT resource_id FROM resource_links WHERE path = ?")
        .bind(path)
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("path {path:?}")))?;
    row.try_get("resource_id").map_err(map_sqlx)
}

pub async fn read_for_resource(
    conn: &mut SqliteConnection,
    resource_id: &str,
) -> StoreResult<Vec<ResourceLink>> {
    let rows = sqlx::query("SELECT * FROM resource_links WHERE resource_id = ? ORDER BY path")
        .bind(resource_id)
        .fetch_all(conn)
        .await
        .map_err(map_sqlx)?;
    rows.iter().map(from_row).collect()
}

#[cfg(test)]
#[path = "resource_links_tests.rs"]
mod tests;

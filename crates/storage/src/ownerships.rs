// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ownership edges: the resource tree authorisation walks.

use crate::error::{map_sqlx, StoreResult};
use bb_core::{Error, Ownership, OwnershipId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<Ownership> {
    Ok(Ownership {
        id: OwnershipId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        owner_resource_id: row.try_get("owner_resource_id").map_err(map_sqlx)?,
        owned_resource_id: row.try_get("owned_resource_id").map_err(map_sqlx)?,
    })
}

pub async fn create(conn: &mut SqliteConnection, ownership: &Ownership) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO ownerships \
         (id, created_at_ms, updated_at_ms, etag, owner_resource_id, owned_resource_id) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(ownership.id.as_str())
    .bind(ownership.created_at_ms)
    .bind(ownership.updated_at_ms)
    .bind(ownership.etag)
    .bind(&ownership.owner_resource_id)
    .bind(&ownership.owned_resource_id)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

/// The parent of a resource, if recorded.
pub async fn parent_of(
    conn: &mut SqliteConnection,
    owned_resource_id: &str,
) -> StoreResult<Option<String>> {
    let row = sqlx::query("SELECT owner_resource_id FROM ownerships WHERE owned_resource_id = ?")
        .bind(owned_resource_id)
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?;
    row.map(|r| r.try_get::<String, _>("owner_resource_id").map_err(map_sqlx))
        .transpose()
}

/// The resource and all of its ancestors, nearest first, following
/// ownership edges upward. Bounded to guard against a corrupted cycle.
pub async fn ancestry(
    conn: &mut SqliteConnection,
    resource_id: &str,
) -> StoreResult<Vec<String>> {
    const MAX_DEPTH: usize = 32;
    let mut chain = vec![resource_id.to_string()];
    let mut current = resource_id.to_string();
    for _ in 0..MAX_DEPTH {
        match parent_of(conn, &current).await? {
            Some(parent) => {
                if chain.contains(&parent) {
                    return Err(Error::internal(format!(
                        "ownership cycle at {parent}"
                    )));
                }
                chain.push(parent.clone());
                current = parent;
            }
            None => return Ok(chain),
        }
    }
    Err(Error::internal(format!("ownership chain too deep at {resource_id}")))
}

pub async fn read(conn: &mut SqliteConnection, id: &OwnershipId) -> StoreResult<Ownership> {
    let row = sqlx::query("SELECT * FROM ownerships WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("ownership {id}")))?;
    from_row(&row)
}

#[cfg(test)]
#[path = "ownerships_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group-membership table.

use crate::error::{map_sqlx, StoreResult};
use bb_core::{Error, GroupId, GroupMembership, IdentityId, MembershipId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<GroupMembership> {
    Ok(GroupMembership {
        id: MembershipId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        group_id: GroupId::from_string(row.try_get::<String, _>("group_id").map_err(map_sqlx)?),
        identity_id: IdentityId::from_string(
            row.try_get::<String, _>("identity_id").map_err(map_sqlx)?,
        ),
        source_system: row.try_get("source_system").map_err(map_sqlx)?,
        added_by: row.try_get("added_by").map_err(map_sqlx)?,
    })
}

async fn read_by_key(
    conn: &mut SqliteConnection,
    group_id: &GroupId,
    identity_id: &IdentityId,
    source_system: &str,
) -> StoreResult<GroupMembership> {
    let row = sqlx::query(
        "SELECT * FROM group_memberships \
         WHERE group_id = ? AND identity_id = ? AND source_system = ?",
    )
    .bind(group_id.as_str())
    .bind(identity_id.as_str())
    .bind(source_system)
    .fetch_optional(conn)
    .await
    .map_err(map_sqlx)?
    .ok_or_else(|| Error::not_found("membership"))?;
    from_row(&row)
}

/// Find or create a membership for (group, identity, source system).
/// Returns `(membership, created)`; `created` is true exactly once per
/// triple.
pub async fn find_or_create(
    conn: &mut SqliteConnection,
    membership: &GroupMembership,
) -> StoreResult<(GroupMembership, bool)> {
    if let Ok(existing) = read_by_key(
        conn,
        &membership.group_id,
        &membership.identity_id,
        &membership.source_system,
    )
    .await
    {
        return Ok((existing, false));
    }
    let result = sqlx::query(
        "INSERT INTO group_memberships \
         (id, created_at_ms, updated_at_ms, etag, group_id, identity_id, source_system, added_by) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(membership.id.as_str())
    .bind(membership.created_at_ms)
    .bind(membership.updated_at_ms)
    .bind(membership.etag)
    .bind(membership.group_id.as_str())
    .bind(membership.identity_id.as_str())
    .bind(&membership.source_system)
    .bind(&membership.added_by)
    .execute(&mut *conn)
    .await
    .map_err(map_sqlx);
    match result {
        Ok(_) => Ok((membership.clone(), true)),
        Err(e) if e.is_already_exists() => Ok((
            read_by_key(
                conn,
                &membership.group_id,
                &membership.identity_id,
                &membership.source_system,
            )
            .await?,
            false,
        )),
        Err(e) => Err(e),
    }
}

/// Remove the membership contributed by one source system only.
pub async fn delete_by_source(
    conn: &mut SqliteConnection,
    group_id: &GroupId,
    identity_id: &IdentityId,
    source_system: &str,
) -> StoreResult<()> {
    let result = sqlx::query(
        "DELETE FROM group_memberships \
         WHERE group_id = ? AND identity_id = ? AND source_system = ?",
    )
    .bind(group_id.as_str())
    .bind(identity_id.as_str())
    .bind(source_system)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found("membership"));
    }
    Ok(())
}

/// Groups an identity belongs to (via any source system).
pub async fn group_ids_for_identity(
    conn: &mut SqliteConnection,
    identity_id: &IdentityId,
) -> StoreResult<Vec<GroupId>> {
    let rows = sqlx::query(
        "SELECT DISTINCT group_id FROM group_memberships WHERE identity_id = ?",
    )
    .bind(identity_id.as_str())
    .fetch_all(conn)
    .await
    .map_err(map_sqlx)?;
    rows.iter()
        .map(|row| {
            Ok(GroupId::from_string(
                row.try_get::<String, _>("group_id").map_err(map_sqlx)?,
            ))
        })
        .collect()
}

#[cfg(test)]
#[path = "memberships_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Grant table.

use crate::error::{map_sqlx, StoreResult};
use crate::json;
use bb_core::{Error, Grant, GrantHolder, GrantId, GroupId, IdentityId, LegalEntityId, Operation};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn holder_parts(holder: &GrantHolder) -> (&'static str, String) {
    match holder {
        GrantHolder::Identity(id) => ("identity", id.as_str().to_string()),
        GrantHolder::Group(id) => ("group", id.as_str().to_string()),
    }
}

fn from_row(row: &SqliteRow) -> StoreResult<Grant> {
    let holder_kind: String = row.try_get("holder_kind").map_err(map_sqlx)?;
    let holder_id: String = row.try_get("holder_id").map_err(map_sqlx)?;
    let holder = match holder_kind.as_str() {
        "identity" => GrantHolder::Identity(IdentityId::from_string(holder_id)),
        "group" => GrantHolder::Group(GroupId::from_string(holder_id)),
        other => {
            return Err(Error::internal(format!("unknown grant holder kind {other:?}")));
        }
    };
    Ok(Grant {
        id: GrantId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        granted_by: LegalEntityId::from_string(
            row.try_get::<String, _>("granted_by").map_err(map_sqlx)?,
        ),
        holder,
        operation: json::tag(
            &row.try_get::<String, _>("operation").map_err(map_sqlx)?,
            Operation::parse,
            "operation",
        )?,
        target_resource_id: row.try_get("target_resource_id").map_err(map_sqlx)?,
    })
}

pub async fn create(conn: &mut SqliteConnection, grant: &Grant) -> StoreResult<()> {
    let (holder_kind, holder_id) = holder_parts(&grant.holder);
    sqlx::query(
        "INSERT INTO grants \
         (id, created_at_ms, updated_at_ms, etag, granted_by, holder_kind, holder_id, \
          operation, target_resource_id) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(grant.id.as_str())
    .bind(grant.created_at_ms)
    .bind(grant.updated_at_ms)
    .bind(grant.etag)
    .bind(grant.granted_by.as_str())
    .bind(holder_kind)
    .bind(holder_id)
    .bind(grant.operation.to_string())
    .bind(&grant.target_resource_id)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

/// Idempotent creation: an existing identical grant is returned as-is.
pub async fn find_or_create(conn: &mut SqliteConnection, grant: &Grant) -> StoreResult<Grant> {
    match create(conn, grant).await {
        Ok(()) => Ok(grant.clone()),
        Err(e) if e.is_already_exists() => {
            let (holder_kind, holder_id) = holder_parts(&grant.holder);
            let row = sqlx::query(
                "SELECT * FROM grants WHERE holder_kind = ? AND holder_id = ? \
                 AND operation = ? AND target_resource_id = ?",
            )
            .bind(holder_kind)
            .bind(holder_id)
            .bind(grant.operation.to_string())
            .bind(&grant.target_resource_id)
            .fetch_one(conn)
            .await
            .map_err(map_sqlx)?;
            from_row(&row)
        }
        Err(e) => Err(e),
    }
}

/// Targets on which any of the holders has been granted `operation`.
pub async fn targets_for_operation(
    conn: &mut SqliteConnection,
    identity_id: &IdentityId,
    group_ids: &[GroupId],
    operation: Operation,
) -> StoreResult<Vec<String>> {
    let groups: Vec<String> = group_ids.iter().map(|g| g.as_str().to_string()).collect();
    let rows = sqlx::query(
        "SELECT target_resource_id FROM grants \
         WHERE operation = ? \
           AND ((holder_kind = 'identity' AND holder_id = ?) \
             OR (holder_kind = 'group' AND holder_id IN \
                 (SELECT value FROM json_each(?))))",
    )
    .bind(operation.to_string())
    .bind(identity_id.as_str())
    .bind(json::to_col(&groups)?)
    .fetch_all(conn)
    .await
    .map_err(map_sqlx)?;
    rows.iter()
        .map(|row| row.try_get::<String, _>("target_resource_id").map_err(map_sqlx))
        .collect()
}

pub async fn delete_for_holder(
    conn: &mut SqliteConnection,
    holder: &GrantHolder,
) -> StoreResult<u64> {
    let (holder_kind, holder_id) = holder_parts(holder);
    let result = sqlx::query("DELETE FROM grants WHERE holder_kind = ? AND holder_id = ?")
        .bind(holder_kind)
        .bind(holder_id)
        .execute(conn)
        .await
        .map_err(map_sqlx)?;
    Ok(result.rows_affected())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity table.

use crate::error::{map_sqlx, StoreResult};
use bb_core::{Error, Identity, IdentityId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<Identity> {
    Ok(Identity {
        id: IdentityId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        owner_resource_id: row.try_get("owner_resource_id").map_err(map_sqlx)?,
    })
}

pub async fn create(conn: &mut SqliteConnection, identity: &Identity) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO identities (id, created_at_ms, updated_at_ms, etag, owner_resource_id) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(identity.id.as_str())
    .bind(identity.created_at_ms)
    .bind(identity.updated_at_ms)
    .bind(identity.etag)
    .bind(&identity.owner_resource_id)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

pub async fn read(conn: &mut SqliteConnection, id: &IdentityId) -> StoreResult<Identity> {
    let row = sqlx::query("SELECT * FROM identities WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("identity {id}")))?;
    from_row(&row)
}

pub async fn read_by_owner(
    conn: &mut SqliteConnection,
    owner_resource_id: &str,
) -> StoreResult<Identity> {
    let row = sqlx::query("SELECT * FROM identities WHERE owner_resource_id = ?")
        .bind(owner_resource_id)
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("identity for {owner_resource_id}")))?;
    from_row(&row)
}

/// Find the identity for an owner or create one. Returns
/// `(identity, created)`.
pub async fn find_or_create(
    conn: &mut SqliteConnection,
    identity: &Identity,
) -> StoreResult<(Identity, bool)> {
    if let Ok(existing) = read_by_owner(conn, &identity.owner_resource_id).await {
        return Ok((existing, false));
    }
    match create(conn, identity).await {
        Ok(()) => Ok((identity.clone(), true)),
        Err(e) if e.is_already_exists() => {
            Ok((read_by_owner(conn, &identity.owner_resource_id).await?, false))
        }
        Err(e) => Err(e),
    }
}

/// Delete an identity with its credentials, memberships, and grants.
pub async fn delete(conn: &mut SqliteConnection, id: &IdentityId) -> StoreResult<()> {
    sqlx::query("DELETE FROM credentials WHERE identity_id = ?")
        .bind(id.as_str())
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx)?;
    sqlx::query("DELETE FROM group_memberships WHERE identity_id = ?")
        .bind(id.as_str())
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx)?;
    sqlx::query("DELETE FROM grants WHERE holder_kind = 'identity' AND holder_id = ?")
        .bind(id.as_str())
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx)?;
    let result = sqlx::query("DELETE FROM identities WHERE id = ?")
        .bind(id.as_str())
        .execute(conn)
        .await
        .map_err(map_sqlx)?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found(format!("identity {id}")));
    }
    Ok(())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group table.

use crate::error::{map_sqlx, StoreResult};
use crate::legal_entities::parse_name;
use bb_core::{Error, Group, GroupId, LegalEntityId, ResourceName};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<Group> {
    Ok(Group {
        id: GroupId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        legal_entity_id: LegalEntityId::from_string(
            row.try_get::<String, _>("legal_entity_id").map_err(map_sqlx)?,
        ),
        name: parse_name(row.try_get::<String, _>("name").map_err(map_sqlx)?)?,
        description: row.try_get("description").map_err(map_sqlx)?,
        is_internal: row.try_get("is_internal").map_err(map_sqlx)?,
        external_id: row.try_get("external_id").map_err(map_sqlx)?,
    })
}

pub async fn create(conn: &mut SqliteConnection, group: &Group) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO access_groups \
         (id, created_at_ms, updated_at_ms, etag, legal_entity_id, name, description, \
          is_internal, external_id) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(group.id.as_str())
    .bind(group.created_at_ms)
    .bind(group.updated_at_ms)
    .bind(group.etag)
    .bind(group.legal_entity_id.as_str())
    .bind(group.name.as_str())
    .bind(&group.description)
    .bind(group.is_internal)
    .bind(&group.external_id)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

pub async fn read(conn: &mut SqliteConnection, id: &GroupId) -> StoreResult<Group> {
    let row = sqlx::query("SELECT * FROM access_groups WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("group {id}")))?;
    from_row(&row)
}

pub async fn read_by_name(
    conn: &mut SqliteConnection,
    legal_entity_id: &LegalEntityId,
    name: &ResourceName,
) -> StoreResult<Group> {
    let row = sqlx::query("SELECT * FROM access_groups WHERE legal_entity_id = ? AND name = ?")
        .bind(legal_entity_id.as_str())
        .bind(name.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("group {name}")))?;
    from_row(&row)
}

pub async fn find_or_create(
    conn: &mut SqliteConnection,
    group: &Group,
) -> StoreResult<(Group, bool)> {
    if let Ok(existing) = read_by_name(conn, &group.legal_entity_id, &group.name).await {
        return Ok((existing, false));
    }
    match create(conn, group).await {
        Ok(()) => Ok((group.clone(), true)),
        Err(e) if e.is_already_exists() => {
            Ok((read_by_name(conn, &group.legal_entity_id, &group.name).await?, false))
        }
        Err(e) => Err(e),
    }
}

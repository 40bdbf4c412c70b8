// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Legal-entity table.

use crate::error::{map_sqlx, StoreResult};
use bb_core::{Error, ErrorCode, LegalEntity, LegalEntityId, ResourceName};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<LegalEntity> {
    Ok(LegalEntity {
        id: LegalEntityId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        name: parse_name(row.try_get::<String, _>("name").map_err(map_sqlx)?)?,
        external_id: row.try_get("external_id").map_err(map_sqlx)?,
    })
}

pub(crate) fn parse_name(raw: String) -> StoreResult<ResourceName> {
    ResourceName::parse(raw)
        .map_err(|e| Error::wrap(ErrorCode::Internal, "stored name violates grammar", e))
}

pub async fn create(conn: &mut SqliteConnection, entity: &LegalEntity) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO legal_entities (id, created_at_ms, updated_at_ms, etag, name, external_id) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(entity.id.as_str())
    .bind(entity.created_at_ms)
    .bind(entity.updated_at_ms)
    .bind(entity.etag)
    .bind(entity.name.as_str())
    .bind(&entity.external_id)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

pub async fn read(conn: &mut SqliteConnection, id: &LegalEntityId) -> StoreResult<LegalEntity> {
    let row = sqlx::query("SELECT * FROM legal_entities WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("legal entity {id}")))?;
    from_row(&row)
}

pub async fn read_by_name(
    conn: &mut SqliteConnection,
    name: &ResourceName,
) -> StoreResult<LegalEntity> {
    let row = sqlx::query("SELECT * FROM legal_entities WHERE name = ?")
        .bind(name.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("legal entity {name}")))?;
    from_row(&row)
}

/// Find an entity by name or create it. Returns `(entity, created)`.
pub async fn find_or_create(
    conn: &mut SqliteConnection,
    entity: &LegalEntity,
) -> StoreResult<(LegalEntity, bool)> {
    if let Ok(existing) = read_by_name(conn, &entity.name).await {
        return Ok((existing, false));
    }
    match create(conn, entity).await {
        Ok(()) => Ok((entity.clone(), true)),
        // Raced another creator; the row exists now.
        Err(e) if e.is_already_exists() => Ok((read_by_name(conn, &entity.name).await?, false)),
        Err(e) => Err(e),
    }
}

pub async fn read_by_external_id(
    conn: &mut SqliteConnection,
    external_id: &str,
) -> StoreResult<LegalEntity> {
    let row = sqlx::query("SELECT * FROM legal_entities WHERE external_id = ?")
        .bind(external_id)
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("legal entity with external id {external_id}")))?;
    from_row(&row)
}

/// Sync upsert keyed by the provider's external ID. Returns
/// `(created, updated)`: a previously unseen external id creates the
/// row `(true, false)`; changed mutable fields rewrite it
/// `(false, true)`; an identical record is a no-op `(false, false)`.
pub async fn upsert_by_external_id(
    conn: &mut SqliteConnection,
    entity: &LegalEntity,
    now_ms: i64,
) -> StoreResult<(bool, bool)> {
    let external_id = match &entity.external_id {
        Some(id) => id.clone(),
        None => {
            return Err(Error::validation("upsert_by_external_id requires an external id"))
        }
    };
    let existing = match read_by_external_id(conn, &external_id).await {
        Ok(existing) => existing,
        Err(e) if e.is_not_found() => {
            create(conn, entity).await?;
            return Ok((true, false));
        }
        Err(e) => return Err(e),
    };
    if existing.name == entity.name {
        return Ok((false, false));
    }
    sqlx::query(
        "UPDATE legal_entities SET name = ?, updated_at_ms = ?, etag = etag + 1 WHERE id = ?",
    )
    .bind(entity.name.as_str())
    .bind(now_ms)
    .bind(existing.id.as_str())
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok((false, true))
}

#[cfg(test)]
#[path = "legal_entities_tests.rs"]
mod tests;

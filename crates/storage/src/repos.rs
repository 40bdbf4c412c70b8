// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repo table, including build-counter allocation.

use crate::error::{map_sqlx, StoreResult};
use crate::legal_entities::parse_name;
use bb_core::{Error, LegalEntityId, Repo, RepoId, ResourceName};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<Repo> {
    Ok(Repo {
        id: RepoId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        legal_entity_id: LegalEntityId::from_string(
            row.try_get::<String, _>("legal_entity_id").map_err(map_sqlx)?,
        ),
        name: parse_name(row.try_get::<String, _>("name").map_err(map_sqlx)?)?,
        external_id: row.try_get("external_id").map_err(map_sqlx)?,
        build_counter: row.try_get("build_counter").map_err(map_sqlx)?,
    })
}

pub async fn create(conn: &mut SqliteConnection, repo: &Repo) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO repos \
         (id, created_at_ms, updated_at_ms, etag, legal_entity_id, name, external_id, build_counter) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(repo.id.as_str())
    .bind(repo.created_at_ms)
    .bind(repo.updated_at_ms)
    .bind(repo.etag)
    .bind(repo.legal_entity_id.as_str())
    .bind(repo.name.as_str())
    .bind(&repo.external_id)
    .bind(repo.build_counter)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

pub async fn read(conn: &mut SqliteConnection, id: &RepoId) -> StoreResult<Repo> {
    let row = sqlx::query("SELECT * FROM repos WHERE id = ?")
        .bind(id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("repo {id}")))?;
    from_row(&row)
}

pub async fn read_by_name(
    conn: &mut SqliteConnection,
    legal_entity_id: &LegalEntityId,
    name: &ResourceName,
) -> StoreResult<Repo> {
    let row = sqlx::query("SELECT * FROM repos WHERE legal_entity_id = ? AND name = ?")
        .bind(legal_entity_id.as_str())
        .bind(name.as_str())
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found(format!("repo {name}")))?;
    from_row(&row)
}

/// Find a repo by (legal entity, name) or create it. Returns
/// `(repo, created)`.
pub async fn find_or_create(
    conn: &mut SqliteConnection,
    repo: &Repo,
) -> StoreResult<(Repo, bool)> {
    if let Ok(existing) = read_by_name(conn, &repo.legal_entity_id, &repo.name).await {
        return Ok((existing, false));
    }
    match create(conn, repo).await {
        Ok(()) => Ok((repo.clone(), true)),
        Err(e) if e.is_already_exists() => {
            Ok((read_by_name(conn, &repo.legal_entity_id, &repo.name).await?, false))
        }
        Err(e) => Err(e),
    }
}

/// Allocate the next build number by incrementing the repo's counter
/// under the write lock of the enclosing transaction. Returns the new
/// value; build names are its string form.
pub async fn allocate_build_number(
    conn: &mut SqliteConnection,
    id: &RepoId,
    now_ms: i64,
) -> StoreResult<i64> {
    let row = sqlx::query(
        "UPDATE repos \
         SET build_counter = build_counter + 1, updated_at_ms = ?, etag = etag + 1 \
         WHERE id = ? \
         RETURNING build_counter",
    )
    .bind(now_ms)
    .bind(id.as_str())
    .fetch_optional(conn)
    .await
    .map_err(map_sqlx)?
    .ok_or_else(|| Error::not_found(format!("repo {id}")))?;
    row.try_get("build_counter").map_err(map_sqlx)
}

#[cfg(test)]
#[path = "repos_tests.rs"]
mod tests;

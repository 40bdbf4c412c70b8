// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secret table. Only ciphertext ever touches this module.

use crate::error::{map_sqlx, StoreResult};
use bb_core::{Error, RepoId, Secret, SecretId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<Secret> {
    Ok(Secret {
        id: SecretId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        repo_id: RepoId::from_string(row.try_get::<String, _>("repo_id").map_err(map_sqlx)?),
        key_name: row.try_get("key_name").map_err(map_sqlx)?,
        encrypted_key: row.try_get("encrypted_key").map_err(map_sqlx)?,
        encrypted_value: row.try_get("encrypted_value").map_err(map_sqlx)?,
        wrapped_data_key: row.try_get("wrapped_data_key").map_err(map_sqlx)?,
    })
}

pub async fn create(conn: &mut SqliteConnection, secret: &Secret) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO secrets \
         (id, created_at_ms, updated_at_ms, etag, repo_id, key_name, \
          encrypted_key, encrypted_value, wrapped_data_key) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(secret.id.as_str())
    .bind(secret.created_at_ms)
    .bind(secret.updated_at_ms)
    .bind(secret.etag)
    .bind(secret.repo_id.as_str())
    .bind(&secret.key_name)
    .bind(&secret.encrypted_key)
    .bind(&secret.encrypted_value)
    .bind(&secret.wrapped_data_key)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

pub async fn read_by_key_name(
    conn: &mut SqliteConnection,
    repo_id: &RepoId,
    key_name: &str,
) -> StoreResult<Secret> {
    let row = sqlx::query("SELECT * FROM secrets WHERE repo_id = ? AND key_name = ?")
        .bind(repo_id.as_str())
        .bind(key_name)
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found("secret"))?;
    from_row(&row)
}

pub async fn list_for_repo(
    conn: &mut SqliteConnection,
    repo_id: &RepoId,
) -> StoreResult<Vec<Secret>> {
    let rows = sqlx::query("SELECT * FROM secrets WHERE repo_id = ? ORDER BY key_name")
        .bind(repo_id.as_str())
        .fetch_all(conn)
        .await
        .map_err(map_sqlx)?;
    rows.iter().map(from_row).collect()
}

pub async fn delete(
    conn: &mut SqliteConnection,
    repo_id: &RepoId,
    key_name: &str,
) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM secrets WHERE repo_id = ? AND key_name = ?")
        .bind(repo_id.as_str())
        .bind(key_name)
        .execute(conn)
        .await
        .map_err(map_sqlx)?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found("secret"));
    }
    Ok(())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential table.

use crate::error::{map_sqlx, StoreResult};
use crate::json;
use bb_core::{Credential, CredentialId, CredentialKind, Error, IdentityId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

fn from_row(row: &SqliteRow) -> StoreResult<Credential> {
    Ok(Credential {
        id: CredentialId::from_string(row.try_get::<String, _>("id").map_err(map_sqlx)?),
        created_at_ms: row.try_get("created_at_ms").map_err(map_sqlx)?,
        updated_at_ms: row.try_get("updated_at_ms").map_err(map_sqlx)?,
        etag: row.try_get("etag").map_err(map_sqlx)?,
        identity_id: IdentityId::from_string(
            row.try_get::<String, _>("identity_id").map_err(map_sqlx)?,
        ),
        kind: json::tag(
            &row.try_get::<String, _>("kind").map_err(map_sqlx)?,
            CredentialKind::parse,
            "credential kind",
        )?,
        enabled: row.try_get("enabled").map_err(map_sqlx)?,
        shared_secret_id: row.try_get("shared_secret_id").map_err(map_sqlx)?,
        shared_secret_hash: row.try_get("shared_secret_hash").map_err(map_sqlx)?,
        shared_secret_salt: row.try_get("shared_secret_salt").map_err(map_sqlx)?,
        certificate_der: row.try_get("certificate_der").map_err(map_sqlx)?,
        public_key_hash: row.try_get("public_key_hash").map_err(map_sqlx)?,
    })
}

pub async fn create(conn: &mut SqliteConnection, credential: &Credential) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO credentials \
         (id, created_at_ms, updated_at_ms, etag, identity_id, kind, enabled, \
          shared_secret_id, shared_secret_hash, shared_secret_salt, \
          certificate_der, public_key_hash) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(credential.id.as_str())
    .bind(credential.created_at_ms)
    .bind(credential.updated_at_ms)
    .bind(credential.etag)
    .bind(credential.identity_id.as_str())
    .bind(credential.kind.to_string())
    .bind(credential.enabled)
    .bind(&credential.shared_secret_id)
    .bind(&credential.shared_secret_hash)
    .bind(&credential.shared_secret_salt)
    .bind(&credential.certificate_der)
    .bind(&credential.public_key_hash)
    .execute(conn)
    .await
    .map_err(map_sqlx)?;
    Ok(())
}

/// Lookup by the public half of a shared secret.
pub async fn read_by_shared_secret_id(
    conn: &mut SqliteConnection,
    shared_secret_id: &str,
) -> StoreResult<Credential> {
    let row = sqlx::query("SELECT * FROM credentials WHERE shared_secret_id = ?")
        .bind(shared_secret_id)
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found("credential"))?;
    from_row(&row)
}

/// Lookup by SHA-256 of a certificate's SubjectPublicKeyInfo.
pub async fn read_by_public_key_hash(
    conn: &mut SqliteConnection,
    public_key_hash: &str,
) -> StoreResult<Credential> {
    let row = sqlx::query("SELECT * FROM credentials WHERE public_key_hash = ?")
        .bind(public_key_hash)
        .fetch_optional(conn)
        .await
        .map_err(map_sqlx)?
        .ok_or_else(|| Error::not_found("credential"))?;
    from_row(&row)
}

pub async fn list_for_identity(
    conn: &mut SqliteConnection,
    identity_id: &IdentityId,
) -> StoreResult<Vec<Credential>> {
    let rows = sqlx::query(
        "SELECT * FROM credentials WHERE identity_id = ? ORDER BY created_at_ms, id",
    )
    .bind(identity_id.as_str())
    .fetch_all(conn)
    .await
    .map_err(map_sqlx)?;
    rows.iter().map(from_row).collect()
}

pub async fn delete(conn: &mut SqliteConnection, id: &CredentialId) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM credentials WHERE id = ?")
        .bind(id.as_str())
        .execute(conn)
        .await
        .map_err(map_sqlx)?;
    if result.rows_affected() == 0 {
        return Err(Error::not_found(format!("credential {id}")));
    }
    Ok(())
}

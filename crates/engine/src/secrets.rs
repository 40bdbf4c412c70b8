// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repo secrets under envelope encryption.
//!
//! Key and value encrypt independently under one data key; the stored
//! resource name is a truncated hash of the plaintext key, so per-repo
//! uniqueness holds without the key ever being stored in clear.

use crate::engine::Engine;
use bb_core::{secret, Clock, Error, RepoId, Result, Secret, SecretId};
use sqlx::SqliteConnection;

impl<C: Clock> Engine<C> {
    /// Store a secret. Fails `AlreadyExists` when the repo already has
    /// one under the same key.
    pub async fn put_secret(&self, repo_id: &RepoId, key: &str, value: &str) -> Result<Secret> {
        if key.is_empty() {
            return Err(Error::validation("secret key must not be empty"));
        }
        let now = self.now_ms();
        let sealed = self.encrypter.encrypt_multi(&[key.as_bytes(), value.as_bytes()])?;
        let (sealed_key, sealed_value) = match sealed.as_slice() {
            [k, v] => (k.clone(), v.clone()),
            _ => return Err(Error::internal("envelope cardinality")),
        };
        let record = Secret {
            id: SecretId::generate(),
            created_at_ms: now,
            updated_at_ms: now,
            etag: 1,
            repo_id: *repo_id,
            key_name: secret::key_name(key),
            encrypted_key: sealed_key.ciphertext,
            encrypted_value: sealed_value.ciphertext,
            wrapped_data_key: sealed_key.wrapped_data_key,
        };
        let mut tx = self.db.begin().await?;
        bb_storage::repos::read(&mut *tx, repo_id).await?;
        bb_storage::secrets::create(&mut *tx, &record).await?;
        self.commit(tx).await?;
        tracing::info!(repo = %repo_id, key_name = %record.key_name, "stored secret");
        Ok(record)
    }

    pub async fn delete_secret(&self, repo_id: &RepoId, key: &str) -> Result<()> {
        let mut tx = self.db.begin().await?;
        bb_storage::secrets::delete(&mut *tx, repo_id, &secret::key_name(key)).await?;
        self.commit(tx).await
    }

    /// Decrypt a secret's value by its plaintext key. Used by dispatch
    /// to resolve `EnvValue::Secret` references.
    pub(crate) async fn resolve_secret(
        &self,
        conn: &mut SqliteConnection,
        repo_id: &RepoId,
        key: &str,
    ) -> Result<String> {
        let record =
            bb_storage::secrets::read_by_key_name(conn, repo_id, &secret::key_name(key)).await?;
        let stored_key =
            self.encrypter.decrypt(&record.encrypted_key, &record.wrapped_data_key)?;
        // Truncated-hash names can collide; the decrypted key is the
        // proof this row is really ours.
        if stored_key != key.as_bytes() {
            return Err(Error::not_found("secret"));
        }
        let value = self.encrypter.decrypt(&record.encrypted_value, &record.wrapped_data_key)?;
        String::from_utf8(value).map_err(|_| Error::internal("secret value is not utf-8"))
    }

    /// Decrypted (key, value) pairs for a repo. Callers hold the
    /// secret-read grant.
    pub async fn list_secrets(&self, repo_id: &RepoId) -> Result<Vec<(String, String)>> {
        let mut tx = self.db.begin().await?;
        let records = bb_storage::secrets::list_for_repo(&mut *tx, repo_id).await?;
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            let key = self.encrypter.decrypt(&record.encrypted_key, &record.wrapped_data_key)?;
            let value =
                self.encrypter.decrypt(&record.encrypted_value, &record.wrapped_data_key)?;
            out.push((
                String::from_utf8(key).map_err(|_| Error::internal("secret key is not utf-8"))?,
                String::from_utf8(value)
                    .map_err(|_| Error::internal("secret value is not utf-8"))?,
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod tests;

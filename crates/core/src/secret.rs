// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repo secrets, stored under envelope encryption.

use crate::repo::RepoId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

crate::define_id! {
    /// Unique identifier for a secret.
    pub struct SecretId("sec-");
}

/// Length of the truncated key-hash used as the secret's resource name.
const KEY_NAME_LEN: usize = 16;

/// Derive the stored resource name for a secret key: a truncated hex
/// SHA-256 of the plaintext key, so per-repo uniqueness is enforced
/// without persisting the key in clear.
pub fn key_name(plaintext_key: &str) -> String {
    let digest = Sha256::digest(plaintext_key.as_bytes());
    let mut out = String::with_capacity(KEY_NAME_LEN);
    for b in digest.iter().take(KEY_NAME_LEN / 2) {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// A per-repo secret. Key and value are independently AEAD-encrypted with
/// one data key, which is itself stored wrapped under the master key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub id: SecretId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    pub repo_id: RepoId,
    /// Truncated hash of the plaintext key; unique within the repo.
    pub key_name: String,
    pub encrypted_key: Vec<u8>,
    pub encrypted_value: Vec<u8>,
    pub wrapped_data_key: Vec<u8>,
}

crate::builder! {
    pub struct SecretBuilder => Secret {
        into {
            key_name: String = "0011223344556677",
        }
        set {
            repo_id: RepoId = RepoId::generate(),
            encrypted_key: Vec<u8> = Vec::new(),
            encrypted_value: Vec<u8> = Vec::new(),
            wrapped_data_key: Vec<u8> = Vec::new(),
        }
        computed {
            id: SecretId = SecretId::generate(),
            created_at_ms: i64 = 0,
            updated_at_ms: i64 = 0,
            etag: i64 = 1,
        }
    }
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared-secret tokens.
//!
//! A token is `bb_<lookup-id>_<secret>`. Only the lookup ID is stored in
//! clear; the secret half is stored as a salted SHA-256. Presented
//! tokens therefore never hit the database in plaintext, and the lookup
//! never scans.

use bb_core::Error;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

const LOOKUP_ID_LEN: usize = 12;
const SECRET_LEN: usize = 32;
const SALT_LEN: usize = 16;
const PREFIX: &str = "bb_";

/// A freshly minted token plus the columns to store for it. The `token`
/// field is shown to the caller once and never again.
#[derive(Debug, Clone)]
pub struct SharedSecretToken {
    pub token: String,
    pub lookup_id: String,
    pub salt: String,
    pub hash: String,
}

fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn hash_secret(salt: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

impl SharedSecretToken {
    /// Mint a new token.
    pub fn mint() -> Self {
        let lookup_id = random_string(LOOKUP_ID_LEN);
        let secret = random_string(SECRET_LEN);
        let salt = random_string(SALT_LEN);
        let hash = hash_secret(&salt, &secret);
        Self { token: format!("{PREFIX}{lookup_id}_{secret}"), lookup_id, salt, hash }
    }
}

/// Split a presented token into (lookup id, secret half).
pub fn split_token(token: &str) -> Result<(&str, &str), Error> {
    let rest = token
        .strip_prefix(PREFIX)
        .ok_or_else(|| Error::unauthorized("malformed token"))?;
    rest.split_once('_')
        .filter(|(id, secret)| !id.is_empty() && !secret.is_empty())
        .ok_or_else(|| Error::unauthorized("malformed token"))
}

/// Constant-time check of a presented secret half against the stored
/// salt and hash.
pub fn verify(secret: &str, salt: &str, stored_hash: &str) -> bool {
    let computed = hash_secret(salt, secret);
    computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

#[cfg(test)]
#[path = "shared_secret_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential verification, in transport precedence order: TLS client
//! certificate, signed bearer token, shared-secret header.

use crate::shared_secret;
use crate::token::SignedTokenIssuer;
use bb_core::{Error, ErrorCode, IdentityId};
use sqlx::SqliteConnection;
use std::sync::Arc;

/// The principal a request was authenticated as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub identity_id: IdentityId,
    /// The legal entity, build, or runner the identity proxies.
    pub owner_resource_id: String,
}

/// Verifies presented credentials against the store and the server key.
#[derive(Clone)]
pub struct Authenticator {
    token_issuer: Arc<SignedTokenIssuer>,
}

impl Authenticator {
    pub fn new(token_issuer: Arc<SignedTokenIssuer>) -> Self {
        Self { token_issuer }
    }

    pub fn token_issuer(&self) -> &SignedTokenIssuer {
        &self.token_issuer
    }

    /// Authenticate a shared-secret token (`bb_<id>_<secret>`).
    pub async fn authenticate_shared_secret(
        &self,
        conn: &mut SqliteConnection,
        token: &str,
    ) -> Result<AuthenticatedIdentity, Error> {
        let (lookup_id, secret) = shared_secret::split_token(token)?;
        let credential = bb_storage::credentials::read_by_shared_secret_id(conn, lookup_id)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    Error::unauthorized("no credential matched")
                } else {
                    e
                }
            })?;
        let (salt, hash) = match (&credential.shared_secret_salt, &credential.shared_secret_hash) {
            (Some(salt), Some(hash)) => (salt, hash),
            _ => return Err(Error::internal("shared-secret credential missing hash columns")),
        };
        if !shared_secret::verify(secret, salt, hash) {
            return Err(Error::unauthorized("no credential matched"));
        }
        self.finish(conn, &credential).await
    }

    /// Authenticate a TLS client certificate by its DER bytes.
    pub async fn authenticate_certificate(
        &self,
        conn: &mut SqliteConnection,
        cert_der: &[u8],
    ) -> Result<AuthenticatedIdentity, Error> {
        let hash = crate::cert::public_key_hash(cert_der)
            .map_err(|_| Error::unauthorized("no credential matched"))?;
        let credential = bb_storage::credentials::read_by_public_key_hash(conn, &hash)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    Error::unauthorized("no credential matched")
                } else {
                    e
                }
            })?;
        self.finish(conn, &credential).await
    }

    /// Authenticate a server-signed bearer token. No credential row is
    /// involved; the signature is the proof.
    pub async fn authenticate_signed_token(
        &self,
        conn: &mut SqliteConnection,
        token: &str,
        now_ms: i64,
    ) -> Result<AuthenticatedIdentity, Error> {
        let claims = self.token_issuer.verify(token, now_ms)?;
        let identity = bb_storage::identities::read(conn, &claims.sub).await.map_err(|e| {
            if e.is_not_found() {
                Error::unauthorized("token subject no longer exists")
            } else {
                e
            }
        })?;
        Ok(AuthenticatedIdentity {
            identity_id: identity.id,
            owner_resource_id: identity.owner_resource_id,
        })
    }

    async fn finish(
        &self,
        conn: &mut SqliteConnection,
        credential: &bb_core::Credential,
    ) -> Result<AuthenticatedIdentity, Error> {
        if !credential.enabled {
            return Err(Error::new(ErrorCode::AccountDisabled, "credential is disabled"));
        }
        let identity = bb_storage::identities::read(conn, &credential.identity_id).await?;
        Ok(AuthenticatedIdentity {
            identity_id: identity.id,
            owner_resource_id: identity.owner_resource_id,
        })
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;

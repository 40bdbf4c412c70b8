// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server-signed bearer tokens.
//!
//! Format: `base64url(claims-json) "." base64url(ed25519-signature)`.
//! Nothing is stored; verification is against the server's public key,
//! so token issuance scales without touching the credential table.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bb_core::{Error, IdentityId};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

/// Default token lifetime: 24 hours.
pub const DEFAULT_TOKEN_TTL_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// The identity the token authenticates.
    pub sub: IdentityId,
    /// Issued-at, epoch ms.
    pub iat: i64,
    /// Expiry, epoch ms.
    pub exp: i64,
}

/// Issues and verifies signed tokens with the server's key pair.
pub struct SignedTokenIssuer {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl SignedTokenIssuer {
    pub fn new(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self { signing_key, verifying_key }
    }

    /// Generate a fresh key pair (first-start provisioning).
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        Self::new(SigningKey::generate(&mut rng))
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Issue a token for an identity, expiring `ttl_ms` from `now_ms`.
    pub fn issue(&self, identity_id: IdentityId, now_ms: i64, ttl_ms: i64) -> Result<String, Error> {
        let claims = TokenClaims { sub: identity_id, iat: now_ms, exp: now_ms + ttl_ms };
        let payload = serde_json::to_vec(&claims)
            .map_err(|e| Error::wrap(bb_core::ErrorCode::Internal, "encoding claims", e))?;
        let signature = self.signing_key.sign(&payload);
        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str, now_ms: i64) -> Result<TokenClaims, Error> {
        let (payload_b64, sig_b64) = token
            .split_once('.')
            .ok_or_else(|| Error::unauthorized("malformed signed token"))?;
        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| Error::unauthorized("malformed signed token"))?;
        let sig_bytes = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| Error::unauthorized("malformed signed token"))?;
        let signature = Signature::from_slice(&sig_bytes)
            .map_err(|_| Error::unauthorized("malformed signed token"))?;
        self.verifying_key
            .verify(&payload, &signature)
            .map_err(|_| Error::unauthorized("token signature invalid"))?;
        let claims: TokenClaims = serde_json::from_slice(&payload)
            .map_err(|_| Error::unauthorized("malformed signed token"))?;
        if claims.exp <= now_ms {
            return Err(Error::unauthorized("token expired"));
        }
        Ok(claims)
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;

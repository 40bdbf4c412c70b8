// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const NOW: i64 = 1_700_000_000_000;

#[test]
fn issued_token_verifies_with_claims() {
    let issuer = SignedTokenIssuer::generate();
    let identity = IdentityId::generate();
    let token = issuer.issue(identity, NOW, DEFAULT_TOKEN_TTL_MS).unwrap();
    let claims = issuer.verify(&token, NOW + 1).unwrap();
    assert_eq!(claims.sub, identity);
    assert_eq!(claims.iat, NOW);
    assert_eq!(claims.exp, NOW + DEFAULT_TOKEN_TTL_MS);
}

#[test]
fn expired_token_is_rejected() {
    let issuer = SignedTokenIssuer::generate();
    let token = issuer.issue(IdentityId::generate(), NOW, 1_000).unwrap();
    // Valid signature, past expiry.
    let err = issuer.verify(&token, NOW + 1_000).unwrap_err();
    assert_eq!(err.code, bb_core::ErrorCode::Unauthorized);
}

#[test]
fn token_signed_by_another_key_is_rejected() {
    let issuer = SignedTokenIssuer::generate();
    let impostor = SignedTokenIssuer::generate();
    let token = impostor.issue(IdentityId::generate(), NOW, DEFAULT_TOKEN_TTL_MS).unwrap();
    let err = issuer.verify(&token, NOW).unwrap_err();
    assert_eq!(err.code, bb_core::ErrorCode::Unauthorized);
}

#[test]
fn tampered_payload_is_rejected() {
    let issuer = SignedTokenIssuer::generate();
    let token = issuer.issue(IdentityId::generate(), NOW, DEFAULT_TOKEN_TTL_MS).unwrap();
    let (payload, sig) = token.split_once('.').unwrap();
    let mut bytes = base64::Engine::decode(
        &base64::engine::general_purpose::URL_SAFE_NO_PAD,
        payload,
    )
    .unwrap();
    bytes[0] ^= 0x01;
    let forged = format!(
        "{}.{sig}",
        base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
    );
    assert!(issuer.verify(&forged, NOW).is_err());
}

#[test]
fn garbage_is_rejected() {
    let issuer = SignedTokenIssuer::generate();
    assert!(issuer.verify("not a token", NOW).is_err());
    assert!(issuer.verify("a.b", NOW).is_err());
}

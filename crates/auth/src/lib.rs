// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bb-auth: identities, credentials, groups, grants.
//!
//! Three credential variants hang off one [`Identity`](bb_core::Identity):
//! shared secrets (salted hash, looked up by a separate public ID),
//! client certificates (keyed by SPKI SHA-256, self-signature verified),
//! and server-signed tokens (ed25519, nothing stored). Authorisation is
//! grant evaluation up the ownership tree.

pub mod asn1;
pub mod authz;
pub mod cert;
pub mod dynamic;
pub mod service;
pub mod shared_secret;
pub mod standard_groups;
pub mod token;

pub use authz::Authorizer;
pub use cert::{public_key_hash, verify_self_signed, ParsedCertificate};
pub use service::{AuthenticatedIdentity, Authenticator};
pub use shared_secret::SharedSecretToken;
pub use token::{SignedTokenIssuer, TokenClaims, DEFAULT_TOKEN_TTL_MS};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identities, credentials, ownership edges, and resource links.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an identity.
    pub struct IdentityId("idn-");
}

crate::define_id! {
    /// Unique identifier for a credential.
    pub struct CredentialId("crd-");
}

crate::define_id! {
    /// Unique identifier for an ownership edge.
    pub struct OwnershipId("own-");
}

crate::define_id! {
    /// Unique identifier for a resource link.
    pub struct ResourceLinkId("rsl-");
}

/// The authorisable principal. An identity proxies exactly one owner: a
/// legal entity, a build (dynamic-build driver), or a runner. Credentials
/// attach to identities; grants target them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    /// ID of the legal entity, build, or runner this identity stands for.
    /// The kind prefix of the ID disambiguates.
    pub owner_resource_id: String,
}

/// Credential variants attached to an identity. The variant tag is a
/// stored `type` column, never runtime-class discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    SharedSecret,
    ClientCertificate,
}

crate::string_enum! {
    CredentialKind {
        SharedSecret => "shared_secret",
        ClientCertificate => "client_certificate",
    }
}

/// A stored credential. Signed tokens are verified against the server key
/// and have no credential row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    pub identity_id: IdentityId,
    pub kind: CredentialKind,
    pub enabled: bool,
    /// Shared secret: random public lookup ID, so presented tokens never
    /// hit the database in plaintext.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret_id: Option<String>,
    /// Shared secret: salted SHA-256 of the secret half.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret_salt: Option<String>,
    /// Client certificate: ASN.1 DER of the registered X.509 certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_der: Option<Vec<u8>>,
    /// Client certificate: hex SHA-256 of the DER SubjectPublicKeyInfo;
    /// the lookup key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_hash: Option<String>,
}

/// Explicit parent→child edge between resources. Authorisation walks these
/// edges upward: a grant on an ancestor covers all descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    pub id: OwnershipId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    pub owner_resource_id: String,
    pub owned_resource_id: String,
}

/// Bijection between a human-readable path (`acme/website/builds/42`) and
/// a resource ID, upserted on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub id: ResourceLinkId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    pub path: String,
    pub resource_id: String,
}

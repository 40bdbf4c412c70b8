// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Grants: operation × target bindings for identities and groups.

use crate::group::GroupId;
use crate::identity::IdentityId;
use crate::legal_entity::LegalEntityId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a grant.
    pub struct GrantId("grt-");
}

/// Operations a grant can confer. Closed set; targets are resource IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    BuildRead,
    BuildCreate,
    BuildCancel,
    JobRead,
    JobCreate,
    JobUpdate,
    StepUpdate,
    ArtifactRead,
    ArtifactCreate,
    LogRead,
    LogWrite,
    SecretRead,
    SecretWrite,
    RepoRead,
    RepoWrite,
    RunnerRead,
    RunnerWrite,
    RunnerDequeue,
}

crate::string_enum! {
    Operation {
        BuildRead => "build:read",
        BuildCreate => "build:create",
        BuildCancel => "build:cancel",
        JobRead => "job:read",
        JobCreate => "job:create",
        JobUpdate => "job:update",
        StepUpdate => "step:update",
        ArtifactRead => "artifact:read",
        ArtifactCreate => "artifact:create",
        LogRead => "log:read",
        LogWrite => "log:write",
        SecretRead => "secret:read",
        SecretWrite => "secret:write",
        RepoRead => "repo:read",
        RepoWrite => "repo:write",
        RunnerRead => "runner:read",
        RunnerWrite => "runner:write",
        RunnerDequeue => "runner:dequeue",
    }
}

impl Operation {
    /// The grant set attached to a dynamic build identity.
    pub fn dynamic_build_set() -> &'static [Operation] {
        &[
            Operation::BuildRead,
            Operation::JobRead,
            Operation::ArtifactRead,
            Operation::JobCreate,
        ]
    }
}

/// The principal side of a grant: a single identity or a whole group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantHolder {
    Identity(IdentityId),
    Group(GroupId),
}

/// Binds a holder to one operation on one target resource (covering the
/// target's descendants via ownership).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub id: GrantId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    /// Legal entity on whose authority the grant was issued.
    pub granted_by: LegalEntityId,
    pub holder: GrantHolder,
    pub operation: Operation,
    pub target_resource_id: String,
}

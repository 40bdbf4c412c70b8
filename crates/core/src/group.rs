// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access-control groups and memberships.

use crate::grant::Operation;
use crate::identity::IdentityId;
use crate::legal_entity::LegalEntityId;
use crate::name::ResourceName;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a group.
    pub struct GroupId("grp-");
}

crate::define_id! {
    /// Unique identifier for a group membership.
    pub struct MembershipId("mem-");
}

/// A named set of identities that co-own a set of operations on the
/// owning legal entity's resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    pub legal_entity_id: LegalEntityId,
    /// Unique within the legal entity.
    pub name: ResourceName,
    pub description: String,
    /// Internal groups are provisioned by the system and cannot be deleted.
    pub is_internal: bool,
    pub external_id: Option<String>,
}

/// Membership of an identity in a group, scoped by the system that added
/// it. Uniqueness is per (group, identity, source-system) so a hand-added
/// membership and a synced one coexist, and losing one source removes
/// only that one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub id: MembershipId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    pub group_id: GroupId,
    pub identity_id: IdentityId,
    /// E.g. `manual` or the SCM sync that produced the membership.
    pub source_system: String,
    pub added_by: String,
}

/// The groups provisioned for every legal entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardGroup {
    Admin,
    User,
    ReadOnlyUser,
}

crate::simple_display! {
    StandardGroup {
        Admin => "admin",
        User => "user",
        ReadOnlyUser => "read-only-user",
    }
}

impl StandardGroup {
    pub fn all() -> &'static [StandardGroup] {
        &[StandardGroup::Admin, StandardGroup::User, StandardGroup::ReadOnlyUser]
    }

    pub fn description(self) -> &'static str {
        match self {
            StandardGroup::Admin => "Full control of the legal entity and its resources",
            StandardGroup::User => "Create and run builds, manage artifacts and secrets",
            StandardGroup::ReadOnlyUser => "Read-only visibility of builds and artifacts",
        }
    }

    /// Operations every member of this group holds on the legal entity.
    pub fn operations(self) -> &'static [Operation] {
        match self {
            StandardGroup::Admin => &[
                Operation::BuildRead,
                Operation::BuildCreate,
                Operation::BuildCancel,
                Operation::JobRead,
                Operation::JobCreate,
                Operation::JobUpdate,
                Operation::StepUpdate,
                Operation::ArtifactRead,
                Operation::ArtifactCreate,
                Operation::LogRead,
                Operation::LogWrite,
                Operation::SecretRead,
                Operation::SecretWrite,
                Operation::RepoRead,
                Operation::RepoWrite,
                Operation::RunnerRead,
                Operation::RunnerWrite,
            ],
            StandardGroup::User => &[
                Operation::BuildRead,
                Operation::BuildCreate,
                Operation::BuildCancel,
                Operation::JobRead,
                Operation::ArtifactRead,
                Operation::ArtifactCreate,
                Operation::LogRead,
                Operation::SecretRead,
                Operation::RepoRead,
            ],
            StandardGroup::ReadOnlyUser => &[
                Operation::BuildRead,
                Operation::JobRead,
                Operation::ArtifactRead,
                Operation::LogRead,
                Operation::RepoRead,
            ],
        }
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Repositories and their monotonic build counters.

use crate::legal_entity::LegalEntityId;
use crate::name::ResourceName;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a repository.
    pub struct RepoId("rep-");
}

/// A source repository belonging to a legal entity.
///
/// `build_counter` is the last allocated build number; build names are
/// allocated by incrementing it under the repo's row lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repo {
    pub id: RepoId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    pub legal_entity_id: LegalEntityId,
    /// Unique within the legal entity.
    pub name: ResourceName,
    pub external_id: Option<String>,
    pub build_counter: i64,
}

crate::builder! {
    pub struct RepoBuilder => Repo {
        set {
            legal_entity_id: LegalEntityId = LegalEntityId::generate(),
            name: ResourceName = ResourceName::must("website"),
            build_counter: i64 = 0,
        }
        option {
            external_id: String = None,
        }
        computed {
            id: RepoId = RepoId::generate(),
            created_at_ms: i64 = 0,
            updated_at_ms: i64 = 0,
            etag: i64 = 1,
        }
    }
}

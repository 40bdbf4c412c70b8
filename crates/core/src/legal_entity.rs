// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Legal entities: the users and organisations that own everything else.

use crate::name::ResourceName;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a user or organisation.
    pub struct LegalEntityId("leg-");
}

/// A user or organisation. Owns runners, repos, secrets, and groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalEntity {
    pub id: LegalEntityId,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub etag: i64,
    /// Unique within the system.
    pub name: ResourceName,
    /// Identifier assigned by the external SCM provider.
    pub external_id: Option<String>,
}

crate::builder! {
    pub struct LegalEntityBuilder => LegalEntity {
        set {
            name: ResourceName = ResourceName::must("acme"),
        }
        option {
            external_id: String = None,
        }
        computed {
            id: LegalEntityId = LegalEntityId::generate(),
            created_at_ms: i64 = 0,
            updated_at_ms: i64 = 0,
            etag: i64 = 1,
        }
    }
}

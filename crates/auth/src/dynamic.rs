// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build-scoped identities for dynamic builds.
//!
//! A running job that wants to add jobs to its own build authenticates
//! as an identity owned by that build, holding only the narrow grant set
//! scoped to the build. The identity is deleted with the build.

use bb_core::{
    BuildId, Grant, GrantHolder, GrantId, Identity, IdentityId, LegalEntityId, Operation,
};
use sqlx::SqliteConnection;

/// Find or create the build's dynamic identity with its grants.
/// Idempotent: repeated calls from racing jobs converge on one identity.
pub async fn ensure_build_identity(
    conn: &mut SqliteConnection,
    build_id: &BuildId,
    granted_by: &LegalEntityId,
    now_ms: i64,
) -> Result<Identity, bb_core::Error> {
    let candidate = Identity {
        id: IdentityId::generate(),
        created_at_ms: now_ms,
        updated_at_ms: now_ms,
        etag: 1,
        owner_resource_id: build_id.as_str().to_string(),
    };
    let (identity, created) = bb_storage::identities::find_or_create(conn, &candidate).await?;
    if created {
        tracing::info!(build = %build_id, identity = %identity.id, "created dynamic build identity");
    }
    for operation in Operation::dynamic_build_set() {
        let grant = Grant {
            id: GrantId::generate(),
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            etag: 1,
            granted_by: *granted_by,
            holder: GrantHolder::Identity(identity.id),
            operation: *operation,
            target_resource_id: build_id.as_str().to_string(),
        };
        bb_storage::grants::find_or_create(conn, &grant).await?;
    }
    Ok(identity)
}

/// Delete the build's dynamic identity, if one exists. Called when the
/// build reaches a terminal status.
pub async fn delete_build_identity(
    conn: &mut SqliteConnection,
    build_id: &BuildId,
) -> Result<bool, bb_core::Error> {
    match bb_storage::identities::read_by_owner(conn, build_id.as_str()).await {
        Ok(identity) => {
            bb_storage::identities::delete(conn, &identity.id).await?;
            tracing::info!(build = %build_id, identity = %identity.id, "deleted dynamic build identity");
            Ok(true)
        }
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "dynamic_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Grant evaluation.
//!
//! An identity may perform an operation on a resource when any grant,
//! held directly or through group membership, names that operation on
//! the resource or on any of its ancestors via ownership.

use bb_core::{Error, ErrorCode, IdentityId, Operation};
use sqlx::SqliteConnection;

#[derive(Clone, Copy, Default)]
pub struct Authorizer;

impl Authorizer {
    /// True when `identity` holds `operation` on `resource_id` or an
    /// ancestor.
    pub async fn is_authorized(
        &self,
        conn: &mut SqliteConnection,
        identity: &IdentityId,
        operation: Operation,
        resource_id: &str,
    ) -> Result<bool, Error> {
        let groups = bb_storage::memberships::group_ids_for_identity(conn, identity).await?;
        let targets =
            bb_storage::grants::targets_for_operation(conn, identity, &groups, operation).await?;
        if targets.is_empty() {
            return Ok(false);
        }
        let ancestry = bb_storage::ownerships::ancestry(conn, resource_id).await?;
        Ok(ancestry.iter().any(|ancestor| targets.iter().any(|t| t == ancestor)))
    }

    /// [`is_authorized`](Self::is_authorized), failing `Unauthorized`.
    pub async fn require(
        &self,
        conn: &mut SqliteConnection,
        identity: &IdentityId,
        operation: Operation,
        resource_id: &str,
    ) -> Result<(), Error> {
        if self.is_authorized(conn, identity, operation, resource_id).await? {
            Ok(())
        } else {
            tracing::debug!(%identity, %operation, resource_id, "authorisation denied");
            Err(Error::new(
                ErrorCode::Unauthorized,
                format!("identity lacks {operation} on {resource_id}"),
            ))
        }
    }
}

#[cfg(test)]
#[path = "authz_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provisioning of the per-entity standard groups.

use bb_core::{
    Grant, GrantHolder, GrantId, Group, GroupId, LegalEntityId, ResourceName, StandardGroup,
};
use sqlx::SqliteConnection;

/// Ensure every standard group exists for the legal entity, each with
/// its predefined operation grants targeting the entity itself.
/// Idempotent; runs inside entity-provisioning transactions.
pub async fn provision(
    conn: &mut SqliteConnection,
    legal_entity_id: &LegalEntityId,
    now_ms: i64,
) -> Result<(), bb_core::Error> {
    for standard in StandardGroup::all() {
        let group = Group {
            id: GroupId::generate(),
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            etag: 1,
            legal_entity_id: *legal_entity_id,
            name: ResourceName::parse(standard.to_string())
                .map_err(|e| bb_core::Error::internal(e.to_string()))?,
            description: standard.description().to_string(),
            is_internal: true,
            external_id: None,
        };
        let (group, created) = bb_storage::groups::find_or_create(conn, &group).await?;
        if created {
            tracing::debug!(group = %group.name, entity = %legal_entity_id, "provisioned group");
        }
        for operation in standard.operations() {
            let grant = Grant {
                id: GrantId::generate(),
                created_at_ms: now_ms,
                updated_at_ms: now_ms,
                etag: 1,
                granted_by: *legal_entity_id,
                holder: GrantHolder::Group(group.id),
                operation: *operation,
                target_resource_id: legal_entity_id.as_str().to_string(),
            };
            bb_storage::grants::find_or_create(conn, &grant).await?;
        }
    }
    Ok(())
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bb_storage::Database;

#[tokio::test]
async fn ensure_is_idempotent() {
    let db = Database::open_in_memory().await.unwrap();
    let mut tx = db.begin().await.unwrap();
    let build_id = BuildId::generate();
    let entity_id = LegalEntityId::generate();

    let first = ensure_build_identity(&mut *tx, &build_id, &entity_id, 1).await.unwrap();
    let second = ensure_build_identity(&mut *tx, &build_id, &entity_id, 2).await.unwrap();
    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn identity_holds_exactly_the_narrow_grant_set() {
    let db = Database::open_in_memory().await.unwrap();
    let mut tx = db.begin().await.unwrap();
    let build_id = BuildId::generate();
    let entity_id = LegalEntityId::generate();
    let identity = ensure_build_identity(&mut *tx, &build_id, &entity_id, 1).await.unwrap();

    let authz = crate::authz::Authorizer;
    for op in Operation::dynamic_build_set() {
        assert!(authz
            .is_authorized(&mut *tx, &identity.id, *op, build_id.as_str())
            .await
            .unwrap());
    }
    // Nothing beyond the build scope.
    assert!(!authz
        .is_authorized(&mut *tx, &identity.id, Operation::BuildCancel, build_id.as_str())
        .await
        .unwrap());
    assert!(!authz
        .is_authorized(&mut *tx, &identity.id, Operation::BuildRead, "bld-other")
        .await
        .unwrap());
}

#[tokio::test]
async fn delete_removes_identity_and_grants() {
    let db = Database::open_in_memory().await.unwrap();
    let mut tx = db.begin().await.unwrap();
    let build_id = BuildId::generate();
    let entity_id = LegalEntityId::generate();
    let identity = ensure_build_identity(&mut *tx, &build_id, &entity_id, 1).await.unwrap();

    assert!(delete_build_identity(&mut *tx, &build_id).await.unwrap());
    let err = bb_storage::identities::read(&mut *tx, &identity.id).await.unwrap_err();
    assert!(err.is_not_found());
    // Second delete is a no-op.
    assert!(!delete_build_identity(&mut *tx, &build_id).await.unwrap());
}

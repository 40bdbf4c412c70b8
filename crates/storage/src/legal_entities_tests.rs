// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_db;
use bb_core::{LegalEntity, ResourceName};

#[tokio::test]
async fn upsert_by_external_id_obeys_the_created_updated_contract() {
    let db = test_db::open().await;
    let mut tx = db.begin().await.unwrap();

    let entity = LegalEntity::builder()
        .name(ResourceName::must("acme-org"))
        .external_id("github:42")
        .build();

    // Unseen external id: created.
    let got = crate::legal_entities::upsert_by_external_id(&mut *tx, &entity, 1).await.unwrap();
    assert_eq!(got, (true, false));

    // Identical record: no-op.
    let got = crate::legal_entities::upsert_by_external_id(&mut *tx, &entity, 2).await.unwrap();
    assert_eq!(got, (false, false));

    // Changed mutable field: updated in place.
    let renamed = LegalEntity {
        name: ResourceName::must("acme-renamed"),
        ..entity.clone()
    };
    let got = crate::legal_entities::upsert_by_external_id(&mut *tx, &renamed, 3).await.unwrap();
    assert_eq!(got, (false, true));

    let stored = crate::legal_entities::read_by_external_id(&mut *tx, "github:42")
        .await
        .unwrap();
    assert_eq!(stored.name, "acme-renamed");
    assert!(stored.etag > 1);
}

#[tokio::test]
async fn upsert_without_external_id_is_rejected() {
    let db = test_db::open().await;
    let mut tx = db.begin().await.unwrap();
    let entity = LegalEntity::builder().name(ResourceName::must("no-ext")).build();
    let err = crate::legal_entities::upsert_by_external_id(&mut *tx, &entity, 1)
        .await
        .unwrap_err();
    assert_eq!(err.code, bb_core::ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn names_are_globally_unique() {
    let db = test_db::open().await;
    let mut tx = db.begin().await.unwrap();
    let a = LegalEntity::builder().name(ResourceName::must("taken")).build();
    crate::legal_entities::create(&mut *tx, &a).await.unwrap();
    let b = LegalEntity::builder().name(ResourceName::must("taken")).build();
    let err = crate::legal_entities::create(&mut *tx, &b).await.unwrap_err();
    assert!(err.is_already_exists());
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_db;
use bb_core::{Ownership, OwnershipId};

fn edge(owner: &str, owned: &str) -> Ownership {
    Ownership {
        id: OwnershipId::generate(),
        created_at_ms: 0,
        updated_at_ms: 0,
        etag: 1,
        owner_resource_id: owner.into(),
        owned_resource_id: owned.into(),
    }
}

#[tokio::test]
async fn ancestry_walks_to_the_root() {
    let db = test_db::open().await;
    let mut tx = db.begin().await.unwrap();
    crate::ownerships::create(&mut *tx, &edge("leg-root", "rep-mid")).await.unwrap();
    crate::ownerships::create(&mut *tx, &edge("rep-mid", "bld-leaf")).await.unwrap();

    let chain = crate::ownerships::ancestry(&mut *tx, "bld-leaf").await.unwrap();
    assert_eq!(chain, vec!["bld-leaf", "rep-mid", "leg-root"]);
}

#[tokio::test]
async fn ancestry_of_root_is_itself() {
    let db = test_db::open().await;
    let mut tx = db.begin().await.unwrap();
    let chain = crate::ownerships::ancestry(&mut *tx, "leg-root").await.unwrap();
    assert_eq!(chain, vec!["leg-root"]);
}

#[tokio::test]
async fn one_resource_has_one_owner() {
    let db = test_db::open().await;
    let mut tx = db.begin().await.unwrap();
    crate::ownerships::create(&mut *tx, &edge("leg-a", "rep-x")).await.unwrap();
    let err = crate::ownerships::create(&mut *tx, &edge("leg-b", "rep-x"))
        .await
        .unwrap_err();
    assert!(err.is_already_exists());
}

#[tokio::test]
async fn ancestry_detects_cycles() {
    let db = test_db::open().await;
    let mut tx = db.begin().await.unwrap();
    crate::ownerships::create(&mut *tx, &edge("a", "b")).await.unwrap();
    crate::ownerships::create(&mut *tx, &edge("b", "a")).await.unwrap();
    let err = crate::ownerships::ancestry(&mut *tx, "a").await.unwrap_err();
    assert_eq!(err.code, bb_core::ErrorCode::Internal);
}

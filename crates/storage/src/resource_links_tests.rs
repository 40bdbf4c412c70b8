// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_db;

#[tokio::test]
async fn upsert_then_resolve() {
    let db = test_db::open().await;
    let mut tx = db.begin().await.unwrap();
    crate::resource_links::upsert(&mut *tx, "acme/website/builds/42", "bld-a", 1)
        .await
        .unwrap();
    let got = crate::resource_links::resolve(&mut *tx, "acme/website/builds/42")
        .await
        .unwrap();
    assert_eq!(got, "bld-a");
}

#[tokio::test]
async fn upsert_steals_path_from_previous_owner() {
    let db = test_db::open().await;
    let mut tx = db.begin().await.unwrap();
    crate::resource_links::upsert(&mut *tx, "acme/website", "rep-old", 1).await.unwrap();
    crate::resource_links::upsert(&mut *tx, "acme/website", "rep-new", 2).await.unwrap();
    let got = crate::resource_links::resolve(&mut *tx, "acme/website").await.unwrap();
    assert_eq!(got, "rep-new");
    // Exactly one link for the path survives.
    let links = crate::resource_links::read_for_resource(&mut *tx, "rep-old").await.unwrap();
    assert!(links.is_empty());
}

#[tokio::test]
async fn resolve_unknown_path_is_not_found() {
    let db = test_db::open().await;
    let mut tx = db.begin().await.unwrap();
    let err = crate::resource_links::resolve(&mut *tx, "nope/nothing").await.unwrap_err();
    assert!(err.is_not_found());
}

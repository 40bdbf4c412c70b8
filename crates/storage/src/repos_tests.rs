// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_db;

#[tokio::test]
async fn allocate_build_number_increments() {
    let db = test_db::open().await;
    let (_, repo) = test_db::seed_repo(&db).await;

    let mut tx = db.begin().await.unwrap();
    let n1 = crate::repos::allocate_build_number(&mut *tx, &repo.id, 1).await.unwrap();
    tx.commit().await.unwrap();
    let mut tx = db.begin().await.unwrap();
    let n2 = crate::repos::allocate_build_number(&mut *tx, &repo.id, 2).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(n1, 1);
    assert_eq!(n2, 2);
}

#[tokio::test]
async fn allocate_build_number_survives_rollback() {
    let db = test_db::open().await;
    let (_, repo) = test_db::seed_repo(&db).await;

    let mut tx = db.begin().await.unwrap();
    let n1 = crate::repos::allocate_build_number(&mut *tx, &repo.id, 1).await.unwrap();
    drop(tx); // rollback

    let mut tx = db.begin().await.unwrap();
    let n2 = crate::repos::allocate_build_number(&mut *tx, &repo.id, 2).await.unwrap();
    tx.commit().await.unwrap();

    // The rolled-back allocation was never visible.
    assert_eq!(n1, 1);
    assert_eq!(n2, 1);
}

#[tokio::test]
async fn allocate_build_number_unknown_repo() {
    let db = test_db::open().await;
    let mut tx = db.begin().await.unwrap();
    let err = crate::repos::allocate_build_number(
        &mut *tx,
        &bb_core::RepoId::generate(),
        1,
    )
    .await
    .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn duplicate_repo_name_is_already_exists() {
    let db = test_db::open().await;
    let (entity, repo) = test_db::seed_repo(&db).await;

    let mut tx = db.begin().await.unwrap();
    let dup = bb_core::Repo::builder()
        .legal_entity_id(entity.id)
        .name(repo.name.clone())
        .build();
    let err = crate::repos::create(&mut *tx, &dup).await.unwrap_err();
    assert!(err.is_already_exists());
}

#[tokio::test]
async fn find_or_create_is_idempotent() {
    let db = test_db::open().await;
    let (entity, repo) = test_db::seed_repo(&db).await;

    let mut tx = db.begin().await.unwrap();
    let candidate = bb_core::Repo::builder()
        .legal_entity_id(entity.id)
        .name(repo.name.clone())
        .build();
    let (found, created) = crate::repos::find_or_create(&mut *tx, &candidate).await.unwrap();
    assert!(!created);
    assert_eq!(found.id, repo.id);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_db;
use bb_core::Event;

#[tokio::test]
async fn counter_starts_at_one_and_increments() {
    let db = test_db::open().await;
    let (_, repo) = test_db::seed_repo(&db).await;
    let build = test_db::seed_build(&db, &repo, "1").await;

    let mut tx = db.begin().await.unwrap();
    let n1 = crate::events::next_sequence_number(&mut *tx, &build.id).await.unwrap();
    let n2 = crate::events::next_sequence_number(&mut *tx, &build.id).await.unwrap();
    tx.commit().await.unwrap();
    let mut tx = db.begin().await.unwrap();
    let n3 = crate::events::next_sequence_number(&mut *tx, &build.id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!((n1, n2, n3), (1, 2, 3));
}

#[tokio::test]
async fn counters_are_per_build() {
    let db = test_db::open().await;
    let (_, repo) = test_db::seed_repo(&db).await;
    let b1 = test_db::seed_build(&db, &repo, "1").await;
    let b2 = test_db::seed_build(&db, &repo, "2").await;

    let mut tx = db.begin().await.unwrap();
    assert_eq!(crate::events::next_sequence_number(&mut *tx, &b1.id).await.unwrap(), 1);
    assert_eq!(crate::events::next_sequence_number(&mut *tx, &b2.id).await.unwrap(), 1);
    assert_eq!(crate::events::next_sequence_number(&mut *tx, &b1.id).await.unwrap(), 2);
    tx.commit().await.unwrap();
}

#[tokio::test]
async fn rolled_back_sequence_leaves_a_gap() {
    let db = test_db::open().await;
    let (_, repo) = test_db::seed_repo(&db).await;
    let build = test_db::seed_build(&db, &repo, "1").await;

    let mut tx = db.begin().await.unwrap();
    let n1 = crate::events::next_sequence_number(&mut *tx, &build.id).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = db.begin().await.unwrap();
    let _gap = crate::events::next_sequence_number(&mut *tx, &build.id).await.unwrap();
    drop(tx); // rollback

    let mut tx = db.begin().await.unwrap();
    let n3 = crate::events::next_sequence_number(&mut *tx, &build.id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(n1, 1);
    // The counter row was rolled back with the transaction, so no gap in
    // this engine; sequence numbers stay strictly increasing either way.
    assert!(n3 > n1);
}

#[tokio::test]
async fn fetch_returns_events_after_watermark_ascending() {
    let db = test_db::open().await;
    let (_, repo) = test_db::seed_repo(&db).await;
    let build = test_db::seed_build(&db, &repo, "1").await;

    let mut tx = db.begin().await.unwrap();
    for _ in 0..5 {
        let sn = crate::events::next_sequence_number(&mut *tx, &build.id).await.unwrap();
        let event = Event::builder().build_id(build.id).sequence_number(sn).build();
        crate::events::create(&mut *tx, &event).await.unwrap();
    }
    tx.commit().await.unwrap();

    let mut tx = db.begin().await.unwrap();
    let got = crate::events::fetch(&mut *tx, &build.id, 2, 10).await.unwrap();
    let sns: Vec<i64> = got.iter().map(|e| e.sequence_number).collect();
    assert_eq!(sns, vec![3, 4, 5]);

    // Limit caps the page.
    let got = crate::events::fetch(&mut *tx, &build.id, 0, 2).await.unwrap();
    assert_eq!(got.len(), 2);
    assert_eq!(got[0].sequence_number, 1);

    // Empty result returns immediately.
    let got = crate::events::fetch(&mut *tx, &build.id, 5, 10).await.unwrap();
    assert!(got.is_empty());
}

#[tokio::test]
async fn duplicate_sequence_number_is_rejected() {
    let db = test_db::open().await;
    let (_, repo) = test_db::seed_repo(&db).await;
    let build = test_db::seed_build(&db, &repo, "1").await;

    let mut tx = db.begin().await.unwrap();
    let e1 = Event::builder().build_id(build.id).sequence_number(1).build();
    crate::events::create(&mut *tx, &e1).await.unwrap();
    let e2 = Event::builder().build_id(build.id).sequence_number(1).build();
    let err = crate::events::create(&mut *tx, &e2).await.unwrap_err();
    assert!(err.is_already_exists());
}

#[tokio::test]
async fn purge_removes_events_and_counter() {
    let db = test_db::open().await;
    let (_, repo) = test_db::seed_repo(&db).await;
    let build = test_db::seed_build(&db, &repo, "1").await;

    let mut tx = db.begin().await.unwrap();
    let sn = crate::events::next_sequence_number(&mut *tx, &build.id).await.unwrap();
    let event = Event::builder().build_id(build.id).sequence_number(sn).build();
    crate::events::create(&mut *tx, &event).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = db.begin().await.unwrap();
    let purged = crate::events::purge_for_build(&mut *tx, &build.id).await.unwrap();
    assert_eq!(purged, 1);
    // Counter restarts lazily at 1.
    let sn = crate::events::next_sequence_number(&mut *tx, &build.id).await.unwrap();
    assert_eq!(sn, 1);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_db;
use bb_core::{ErrorCode, LogDescriptor};

#[tokio::test]
async fn append_accumulates_size() {
    let db = test_db::open().await;
    let log = LogDescriptor::builder().resource_id("bld-x").build();
    let mut tx = db.begin().await.unwrap();
    crate::logs::create(&mut *tx, &log).await.unwrap();
    crate::logs::record_append(&mut *tx, &log.id, 100, 1).await.unwrap();
    crate::logs::record_append(&mut *tx, &log.id, 50, 2).await.unwrap();
    let got = crate::logs::read(&mut *tx, &log.id).await.unwrap();
    assert_eq!(got.size_bytes, 150);
}

#[tokio::test]
async fn sealed_log_rejects_appends() {
    let db = test_db::open().await;
    let log = LogDescriptor::builder().resource_id("job-x").build();
    let mut tx = db.begin().await.unwrap();
    crate::logs::create(&mut *tx, &log).await.unwrap();
    crate::logs::seal(&mut *tx, &log.id, 1).await.unwrap();
    let err = crate::logs::record_append(&mut *tx, &log.id, 10, 2).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::LogClosed);
}

#[tokio::test]
async fn seal_is_idempotent() {
    let db = test_db::open().await;
    let log = LogDescriptor::builder().resource_id("stp-x").build();
    let mut tx = db.begin().await.unwrap();
    crate::logs::create(&mut *tx, &log).await.unwrap();
    crate::logs::seal(&mut *tx, &log.id, 1).await.unwrap();
    crate::logs::seal(&mut *tx, &log.id, 2).await.unwrap();
    let got = crate::logs::read(&mut *tx, &log.id).await.unwrap();
    assert!(got.sealed);
}

#[tokio::test]
async fn children_form_a_tree() {
    let db = test_db::open().await;
    let root = LogDescriptor::builder().resource_id("bld-tree").build();
    let child = LogDescriptor::builder().resource_id("job-tree").parent_id(root.id).build();
    let mut tx = db.begin().await.unwrap();
    crate::logs::create(&mut *tx, &root).await.unwrap();
    crate::logs::create(&mut *tx, &child).await.unwrap();
    let kids = crate::logs::children(&mut *tx, &root.id).await.unwrap();
    assert_eq!(kids.len(), 1);
    assert_eq!(kids[0].id, child.id);
}

#[tokio::test]
async fn append_to_missing_log_is_not_found() {
    let db = test_db::open().await;
    let mut tx = db.begin().await.unwrap();
    let err = crate::logs::record_append(&mut *tx, &bb_core::LogDescriptorId::generate(), 1, 1)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
